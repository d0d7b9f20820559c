use core::fmt;

/// Holds the context for the current step of a sync. Used for prefixing logs.
#[derive(Default, Debug)]
pub struct Context {
    /// The backup prefix being synced.
    pub prefix: Option<String>,

    /// The current context.
    pub current_context: &'static str,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "[{prefix}] ")?;
        }

        write!(f, "[{}] ", self.current_context)?;

        Ok(())
    }
}
