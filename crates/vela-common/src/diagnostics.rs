//! Diagnostic records and the message table.
//!
//! The resolver never throws for language-level errors: it posts a
//! diagnostic to the sink and keeps going with a degraded type. Message
//! templates use `{0}`-style placeholders filled by `format_message`.

use crate::span::Span;
use crate::UnitId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

/// A static message template with its code and category.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

macro_rules! define_messages {
    ($($name:ident = ($code:expr, $category:ident, $message:expr);)*) => {
        $(
            pub const $name: super::DiagnosticMessage = super::DiagnosticMessage {
                code: $code,
                category: super::DiagnosticCategory::$category,
                message: $message,
            };
        )*
    };
}

pub mod diagnostic_messages {
    define_messages! {
        CANNOT_FIND_NAME = (2304, Error, "Cannot find name '{0}'.");
        WRONG_TYPE_ARGUMENT_COUNT = (2314, Error, "Generic type '{0}' requires {1} type argument(s).");
        TYPE_NOT_ASSIGNABLE = (2322, Error, "Type '{0}' is not assignable to type '{1}'.");
        TYPES_OF_PROPERTY_INCOMPATIBLE = (2326, Error, "Types of property '{0}' are incompatible.");
        PROPERTY_DOES_NOT_EXIST = (2339, Error, "Property '{0}' does not exist on type '{1}'.");
        TYPE_ARGUMENT_CONSTRAINT = (2344, Error, "Type '{0}' does not satisfy the constraint '{1}'.");
        ARGUMENT_NOT_ASSIGNABLE = (2345, Error, "Argument of type '{0}' is not assignable to parameter of type '{1}'.");
        NOT_CALLABLE = (2349, Error, "This expression is not callable.");
        NOT_CONSTRUCTABLE = (2351, Error, "This expression is not constructable.");
        ARITHMETIC_OPERAND = (2362, Error, "An arithmetic operand must be of type 'any', 'number', or an enum type.");
        DUPLICATE_SIGNATURE = (2393, Error, "Duplicate signature for '{0}'.");
        SUBSEQUENT_DECLARATIONS_SAME_TYPE = (2403, Error, "Subsequent variable declarations must have the same type. Variable '{0}' has type '{1}', but here has type '{2}'.");
        PROPERTY_NOT_ASSIGNABLE_TO_INDEX = (2411, Error, "Property '{0}' of type '{1}' is not assignable to index type '{2}'.");
        NO_OVERLOAD_MATCHES = (2769, Error, "No overload matches this call.");
        AMBIGUOUS_OVERLOAD = (2787, Error, "The call is ambiguous between multiple compatible overloads.");
    }
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Secondary location attached to a diagnostic, used for nested
/// comparison elaboration ("types of property 'x' are incompatible").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInformation {
    pub code: u32,
    pub unit: UnitId,
    pub span: Span,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub unit: UnitId,
    pub span: Span,
    pub message_text: String,
    pub related_information: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn with_related(
        mut self,
        code: u32,
        unit: UnitId,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(RelatedInformation {
            code,
            unit,
            span,
            message_text: message.into(),
        });
        self
    }
}

/// Collects diagnostics produced during a resolution session.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a diagnostic from a template and arguments.
    pub fn post(
        &mut self,
        unit: UnitId,
        span: Span,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> &mut Diagnostic {
        let index = self.diagnostics.len();
        self.diagnostics.push(Diagnostic {
            category: message.category,
            code: message.code,
            unit,
            span,
            message_text: format_message(message.message, args),
            related_information: Vec::new(),
        });
        &mut self.diagnostics[index]
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Error)
            .count()
    }

    pub fn has_code(&self, code: u32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
