use std::borrow::Cow;

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    /// The input itself is malformed: a blank topic name, a non-primitive
    /// match value, a zero TTL.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A topic token did not resolve against the registry. This is distinct
    /// from [`HeraldError::InvalidArgument`]: the value is well-formed but
    /// names no registered topic.
    #[error("Invalid topic{}: {message}", format_context(.context))]
    InvalidTopic { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No matching response arrived before the request TTL elapsed.
    /// Only ever delivered through a [`crate::PendingReply`], never raised
    /// synchronously.
    #[error("Request timed out{}: {message}", format_context(.context))]
    RequestTimeout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl HeraldError {
    pub(crate) fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument { message: message.into(), context: None }
    }

    pub(crate) fn invalid_topic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidTopic { message: message.into(), context: None }
    }

    pub(crate) fn request_timeout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::RequestTimeout { message: message.into(), context: None }
    }
}

/// Adds `.context(..)` to any `Result<T, HeraldError>`.
pub trait HeraldErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, HeraldError>;
}

impl<T> HeraldErrorExt<T> for Result<T, HeraldError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                HeraldError::InvalidArgument { context: c, .. }
                | HeraldError::InvalidTopic { context: c, .. }
                | HeraldError::RequestTimeout { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_appended_to_display() {
        let err: Result<(), HeraldError> =
            Err(HeraldError::invalid_topic("unknown token")).context("say");
        let rendered = err.unwrap_err().to_string();
        assert_eq!(rendered, "Invalid topic (say): unknown token");
    }

    #[test]
    fn display_without_context() {
        let err = HeraldError::invalid_argument("topic name is blank");
        assert_eq!(err.to_string(), "Invalid argument: topic name is blank");
    }
}
