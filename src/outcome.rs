//! Outcome of a single fetch task, as it crosses the result channel.

/// Tagged success/failure value produced exactly once per fetch task.
///
/// The error side is a human-readable message rather than a structured
/// code: it is rendered verbatim into the client report, and nothing on
/// the consuming side branches on the failure kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok(String),
    Err(String),
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, FetchOutcome::Err(_))
    }

    pub fn ok(&self) -> Option<&str> {
        match self {
            FetchOutcome::Ok(body) => Some(body),
            FetchOutcome::Err(_) => None,
        }
    }

    pub fn err(&self) -> Option<&str> {
        match self {
            FetchOutcome::Ok(_) => None,
            FetchOutcome::Err(message) => Some(message),
        }
    }

    /// One report line, without the trailing newline.
    pub fn render(&self) -> String {
        match self {
            FetchOutcome::Ok(body) => format!("Ok({body})"),
            FetchOutcome::Err(message) => format!("Err({message})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ok = FetchOutcome::Ok("body".to_string());
        assert!(ok.is_ok());
        assert!(!ok.is_err());
        assert_eq!(ok.ok(), Some("body"));
        assert_eq!(ok.err(), None);

        let err = FetchOutcome::Err("boom".to_string());
        assert!(err.is_err());
        assert_eq!(err.ok(), None);
        assert_eq!(err.err(), Some("boom"));
    }

    #[test]
    fn test_render() {
        assert_eq!(FetchOutcome::Ok("hello".into()).render(), "Ok(hello)");
        assert_eq!(
            FetchOutcome::Err("got http status 404".into()).render(),
            "Err(got http status 404)"
        );
    }
}
