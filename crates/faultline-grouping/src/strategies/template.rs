//! Server-side template grouping: the rendered filename plus the line
//! that raised, under the default variant.

use faultline_protocol::Template;

use crate::component::GroupingComponent;
use crate::context::{GroupingContext, VariantKind};
use crate::strategies::StrategyOutput;

pub(crate) fn template_variants(
    template: &Template,
    _ctx: GroupingContext<'_>,
) -> StrategyOutput {
    let mut filename = GroupingComponent::new("filename");
    if let Some(name) = template.filename.as_deref() {
        filename.push(name);
    }

    let mut context_line = GroupingComponent::new("context-line");
    if let Some(line) = template.context_line.as_deref() {
        context_line.push(line);
    }

    let component =
        GroupingComponent::with_values("template", [filename.into(), context_line.into()]);
    let mut output = StrategyOutput::default();
    output.variants.insert(VariantKind::Default, component);
    output
}
