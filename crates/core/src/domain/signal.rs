// Signal specification accepted by kill operations

use std::fmt;

/// A signal given either by number or by name (`SIGTERM`, `TERM`, `term`)
///
/// Number 0 is the liveness probe: nothing is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSpec {
    Number(i32),
    Name(String),
}

impl SignalSpec {
    /// The liveness probe (`kill(pid, 0)`)
    pub const PROBE: SignalSpec = SignalSpec::Number(0);

    pub fn is_probe(&self) -> bool {
        match self {
            SignalSpec::Number(n) => *n == 0,
            SignalSpec::Name(name) => name.trim() == "0",
        }
    }

    /// Canonical upper-case name with the `SIG` prefix, or the numeric form
    /// when the name is all digits
    pub fn normalized(&self) -> SignalSpec {
        match self {
            SignalSpec::Number(n) => SignalSpec::Number(*n),
            SignalSpec::Name(name) => {
                let trimmed = name.trim();
                if let Ok(n) = trimmed.parse::<i32>() {
                    return SignalSpec::Number(n);
                }
                let upper = trimmed.to_ascii_uppercase();
                if upper.starts_with("SIG") {
                    SignalSpec::Name(upper)
                } else {
                    SignalSpec::Name(format!("SIG{}", upper))
                }
            }
        }
    }
}

impl From<i32> for SignalSpec {
    fn from(n: i32) -> Self {
        SignalSpec::Number(n)
    }
}

impl From<&str> for SignalSpec {
    fn from(name: &str) -> Self {
        SignalSpec::Name(name.to_string())
    }
}

impl From<String> for SignalSpec {
    fn from(name: String) -> Self {
        SignalSpec::Name(name)
    }
}

impl From<&SignalSpec> for SignalSpec {
    fn from(spec: &SignalSpec) -> Self {
        spec.clone()
    }
}

impl fmt::Display for SignalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSpec::Number(n) => write!(f, "{}", n),
            SignalSpec::Name(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_names() {
        assert_eq!(
            SignalSpec::from("term").normalized(),
            SignalSpec::Name("SIGTERM".into())
        );
        assert_eq!(
            SignalSpec::from("SIGKILL").normalized(),
            SignalSpec::Name("SIGKILL".into())
        );
        assert_eq!(SignalSpec::from(" 9 ").normalized(), SignalSpec::Number(9));
    }

    #[test]
    fn test_probe_detection() {
        assert!(SignalSpec::PROBE.is_probe());
        assert!(SignalSpec::from("0").is_probe());
        assert!(!SignalSpec::from(15).is_probe());
    }
}
