//! Error collection and rendering
//!
//! Every node of a tree is queried; an error is reported at the node whose
//! rule produced it. Nodes that merely pass an error on (a variable whose
//! initializer failed, an operator over a failed operand) return a type
//! still pointing at the origin and stay quiet, so one mistake gives one
//! diagnostic.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use typec_ast::{NodeId, Program};

use crate::context::TypeContext;
use crate::error::TypeError;

pub fn collect_diagnostics(
    ctx: &mut TypeContext,
    program: &Program,
    root: NodeId,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    for node in program.descendants(root) {
        let ty = ctx.get_type(program, node);
        let Some(err) = ty.as_error() else {
            continue;
        };
        if err.kind.is_placeholder() || ty.node() != Some(node) {
            continue;
        }
        let mut error = TypeError::new(err.kind.clone(), program.span(node), node);
        error.expected = err.expected.as_ref().map(|t| t.to_string());
        errors.push(error);
    }
    tracing::debug!(count = errors.len(), "collected diagnostics");
    errors
}

impl TypeError {
    /// Render as a plain-text report over `source`
    pub fn to_report(&self, filename: &str, source: &str) -> String {
        let span = (filename, self.span.start..self.span.end);
        let label = match &self.expected {
            Some(expected) => format!("expected {}", expected),
            None => self.kind.to_string(),
        };

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, span.clone())
            .with_config(Config::default().with_color(false))
            .with_code(self.code())
            .with_message(self.kind.to_string())
            .with_label(Label::new(span).with_message(label).with_color(Color::Red))
            .finish()
            .write((filename, Source::from(source)), &mut out);
        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
