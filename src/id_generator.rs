//! Identifier generation for new packs.

use uuid::Uuid;

/// Supplies globally-unique opaque identifiers.
///
/// The store calls this once per `new_pack`. Any generator whose collision
/// probability is negligible over a session satisfies the contract.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random UUID v4 identifiers, the default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}
