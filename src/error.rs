use std::fmt;

/// A simulation call routed to an entity that only mirrors server state, or
/// the reverse. Always a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityError {
    Mirrored {
        entity: &'static str,
        operation: &'static str,
    },
    Simulated {
        entity: &'static str,
        operation: &'static str,
    },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::Mirrored { entity, operation } => {
                write!(f, "{operation} is not available on a network {entity}")
            }
            EntityError::Simulated { entity, operation } => {
                write!(f, "{operation} is not available on a local {entity}")
            }
        }
    }
}

impl std::error::Error for EntityError {}

/// Errors that escape a frame update. Network trouble never shows up here:
/// states handle it by falling back to the menu.
#[derive(Debug)]
pub enum GameError {
    Entity(EntityError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Entity(e) => write!(f, "entity capability mismatch: {e}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Entity(e) => Some(e),
        }
    }
}

impl From<EntityError> for GameError {
    fn from(e: EntityError) -> Self {
        GameError::Entity(e)
    }
}
