use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::pattern::Pattern;

/// Canned device output keyed by trigger pattern.
///
/// Deserialized from a JSON object; entries keep the order they have in the
/// file, which is the order their outputs are emitted in.
#[derive(Debug, Clone, Default)]
pub struct SimulatedResponses {
    entries: Vec<(Pattern, String)>,
}

impl SimulatedResponses {
    pub fn new(entries: Vec<(Pattern, String)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Outputs of every trigger matching `entered`, in mapping order.
    pub fn respond<'a>(&'a self, entered: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(trigger, _)| trigger.matches(entered))
            .map(|(_, output)| output.as_str())
    }
}

impl<'de> Deserialize<'de> for SimulatedResponses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SimulatedResponses;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of trigger pattern to output text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((trigger, output)) = map.next_entry::<String, String>()? {
                    entries.push((Pattern::from(trigger), output));
                }
                Ok(SimulatedResponses { entries })
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
