use std::fmt;
use std::str::FromStr;

use anyhow::{Context, ensure};

/// Servers to measure against on each refresh.
///
/// `Auto` lets the tool choose a server itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSet {
    #[default]
    Auto,
    Servers(Vec<u64>),
}

impl TargetSet {
    /// Ids to request, in order. The automatic target is a single `None`.
    pub fn resolve(&self) -> Vec<Option<u64>> {
        match self {
            TargetSet::Auto => vec![None],
            TargetSet::Servers(ids) => ids.iter().copied().map(Some).collect(),
        }
    }
}

impl FromStr for TargetSet {
    type Err = anyhow::Error;

    /// Parses a comma separated id list such as `"1234, 5678"`. Blank items
    /// are skipped; an empty list means [`TargetSet::Auto`]. Id `0` is not a
    /// server and is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ids = s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let id = item
                    .parse::<u64>()
                    .with_context(|| format!("Invalid server id '{}'", item))?;
                ensure!(
                    id != 0,
                    "Invalid server id '0': leave the list empty to let the tool pick a server"
                );
                Ok(id)
            })
            .collect::<anyhow::Result<Vec<u64>>>()?;

        if ids.is_empty() {
            Ok(TargetSet::Auto)
        } else {
            Ok(TargetSet::Servers(ids))
        }
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSet::Auto => write!(f, "auto"),
            TargetSet::Servers(ids) => {
                let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
                write!(f, "{}", ids.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_to_single_default() {
        assert_eq!(TargetSet::Auto.resolve(), vec![None]);
        assert_eq!(TargetSet::default(), TargetSet::Auto);
    }

    #[test]
    fn test_parse_list() {
        let targets: TargetSet = "1, 2,3".parse().unwrap();
        assert_eq!(targets, TargetSet::Servers(vec![1, 2, 3]));
        assert_eq!(targets.resolve(), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(targets.to_string(), "1,2,3");
    }

    #[test]
    fn test_parse_blank_is_auto() {
        assert_eq!("".parse::<TargetSet>().unwrap(), TargetSet::Auto);
        assert_eq!(" , ".parse::<TargetSet>().unwrap(), TargetSet::Auto);
        assert_eq!("7,,".parse::<TargetSet>().unwrap(), TargetSet::Servers(vec![7]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "1,abc".parse::<TargetSet>().unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_parse_rejects_zero_id() {
        assert!("0".parse::<TargetSet>().is_err());
        assert!("12, 0".parse::<TargetSet>().is_err());
    }
}
