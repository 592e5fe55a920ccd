use crate::common::epoch_millis_or_zero;
use crate::document::Value;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::ID_GENERATOR;
use log::{info, warn};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;
use std::fmt::{Debug, Display};

const NODE_ID_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const TIMESTAMP_SHIFT: u64 = NODE_ID_BITS + SEQUENCE_BITS;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;
// Twitter snowflake epoch, 2010-11-04
const EPOCH: u64 = 1288834974657;

struct GeneratorState {
    sequence: u64,
    last_timestamp: u64,
}

/// Snowflake-style generator for unique document identifiers.
///
/// Identifiers combine a millisecond timestamp, a node id derived from a
/// random UUID, and a per-process sequence. They are unique for the lifetime
/// of the running store instance and collision-resistant for a single local
/// dataset; no cross-instance coordination is attempted.
pub struct SnowflakeIdGenerator {
    node_id: u64,
    state: Mutex<GeneratorState>,
}

impl SnowflakeIdGenerator {
    pub fn new() -> Self {
        let mut node_id = derive_node_id();
        if node_id > MAX_NODE_ID {
            warn!("Node id can't be greater than {}", MAX_NODE_ID);
            node_id = OsRng.gen_range(1..=MAX_NODE_ID);
        }
        info!("Id generator initialized with node id: {}", node_id);

        SnowflakeIdGenerator {
            node_id,
            state: Mutex::new(GeneratorState {
                sequence: 0,
                last_timestamp: 0,
            }),
        }
    }

    /// Generates the next unique id.
    ///
    /// Timestamps never move backwards: if the wall clock regresses, the
    /// last observed timestamp is reused and the sequence disambiguates.
    pub fn next_id(&self) -> u64 {
        let mut state = self.state.lock();

        let mut timestamp = epoch_millis_or_zero() as u64;
        if timestamp < state.last_timestamp {
            timestamp = state.last_timestamp;
        }

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // sequence exhausted within this millisecond
                timestamp += 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = timestamp;
        let sequence = state.sequence;
        drop(state);

        ((timestamp - EPOCH) << TIMESTAMP_SHIFT) | (self.node_id << SEQUENCE_BITS) | sequence
    }
}

impl Default for SnowflakeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_node_id() -> u64 {
    let uuid = uuid::Uuid::new_v4();
    let uid = uuid.as_bytes();
    let rnd_byte = OsRng.gen::<u64>() & 0x0000_00FF;

    ((0x0000_00FF & uid[uid.len() - 1] as u64) | (0x0000_FF00 & (rnd_byte << 8))) >> 6
}

/// A unique identifier for documents.
///
/// Each document in a collection is uniquely identified by a `DocId` stored
/// in its `_id` field. Ids are generated by the process-wide
/// [SnowflakeIdGenerator] when a document is inserted without one.
///
/// Ids convert to `Value::String` for storage, so they survive the JSON
/// round trip through the backing medium unchanged and can be matched with
/// plain equality filters:
///
/// ```rust,ignore
/// let result = store.insert_one("designs", doc)?;
/// let found = store.find_one("designs", &Filter::parse(&doc! {
///     "_id": result.inserted_id.clone()
/// })?)?;
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct DocId {
    id_value: u64,
}

impl DocId {
    /// Generates a new unique `DocId`.
    pub fn new() -> Self {
        DocId {
            id_value: ID_GENERATOR.next_id(),
        }
    }

    /// Parses a `DocId` from its string form.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidId` error when the string is not a decimal id.
    pub fn parse(value: &str) -> DocketResult<DocId> {
        let id_value = value.parse::<u64>().map_err(|err| {
            log::error!("Invalid document id '{}': {}", value, err);
            DocketError::new(
                &format!("invalid document id: {}", value),
                ErrorKind::InvalidId,
            )
        })?;
        Ok(DocId { id_value })
    }

    /// Gets the numeric value of this id.
    pub fn id_value(&self) -> u64 {
        self.id_value
    }
}

impl Default for DocId {
    fn default() -> Self {
        DocId::new()
    }
}

impl Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_value)
    }
}

impl Debug for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocId({})", self.id_value)
    }
}

impl From<DocId> for Value {
    fn from(id: DocId) -> Self {
        Value::String(id.to_string())
    }
}
