//! Log formatting helpers.

use std::fmt;

use serde::Serialize;

/// Renders a value as an indented YAML block under the log message.
///
/// ```ignore
/// debug!("custom property action: {}", Pretty(&action));
/// ```
pub struct Pretty<T>(pub T);

impl<T: Serialize> fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yaml = match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => yaml,
            Err(e) => return write!(f, "<unserializable: {e}>"),
        };
        for line in yaml.lines() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

impl<T: Serialize> fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
