//! Part-name parsing.

use std::fmt;

/// Components of a part name.
///
/// Part names have the form
/// `<partition_id>_<min_block>_<max_block>_<level>[_<mutation>]`.
/// Successive in-place mutations of one logical part only change the
/// trailing mutation number, so [`PartInfo::name_without_mutation`] is the
/// stable name of the logical part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartInfo {
    /// Partition the part belongs to.
    pub partition_id: String,
    /// First block number covered.
    pub min_block: u64,
    /// Last block number covered.
    pub max_block: u64,
    /// Merge level.
    pub level: u32,
    /// Mutation version, if the part was mutated.
    pub mutation: Option<u64>,
}

impl PartInfo {
    /// Parses a part name. Returns `None` if the name is not well-formed.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let fields: Vec<&str> = name.split('_').collect();
        if fields.len() != 4 && fields.len() != 5 {
            return None;
        }
        if fields[0].is_empty() {
            return None;
        }

        let min_block = fields[1].parse().ok()?;
        let max_block = fields[2].parse().ok()?;
        let level = fields[3].parse().ok()?;
        let mutation = match fields.get(4) {
            Some(m) => Some(m.parse().ok()?),
            None => None,
        };

        if min_block > max_block {
            return None;
        }

        Some(Self {
            partition_id: fields[0].to_string(),
            min_block,
            max_block,
            level,
            mutation,
        })
    }

    /// Returns the part name with the mutation component dropped.
    #[must_use]
    pub fn name_without_mutation(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.partition_id, self.min_block, self.max_block, self.level
        )
    }

    /// Strips the mutation component from a raw part name.
    ///
    /// Names that do not parse are returned unchanged.
    #[must_use]
    pub fn strip_mutation(name: &str) -> String {
        Self::parse(name).map_or_else(|| name.to_string(), |info| info.name_without_mutation())
    }

    /// Partition id of a raw part name, or an empty string if it does not parse.
    #[must_use]
    pub fn partition_of(name: &str) -> String {
        Self::parse(name).map(|info| info.partition_id).unwrap_or_default()
    }
}

impl fmt::Display for PartInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name_without_mutation())?;
        if let Some(mutation) = self.mutation {
            write!(f, "_{mutation}")?;
        }
        Ok(())
    }
}
