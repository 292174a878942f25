use serde::{Deserialize, Serialize};

use crate::{Query, WriteRequest};

/// Identifier minted by the state for every live query it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Look up the signed-in operator.
    ResolveIdentity,
    SignOut,
    Subscribe { id: SubscriptionId, query: Query },
    Unsubscribe { id: SubscriptionId },
    Write(WriteRequest),
}
