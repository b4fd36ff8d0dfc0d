use shared::{
    domain::{AddressLines, Coordinate, PositionFix},
    error::{AddressError, PositionError},
};

/// Progress of one request cycle. The variants make impossible field
/// combinations (resolving with no position, address alongside an address
/// error) unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RequestPhase {
    Idle,
    RequestingPosition,
    PositionFailed {
        error: PositionError,
    },
    ResolvingAddress {
        position: PositionFix,
    },
    AddressResolved {
        position: PositionFix,
        address: AddressLines,
    },
    AddressFailed {
        position: PositionFix,
        error: AddressError,
    },
}

/// Immutable view of the orchestrator state for the display layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestSnapshot {
    pub position: Option<Coordinate>,
    pub is_requesting_position: bool,
    pub last_position_error: Option<PositionError>,
    pub address: Option<AddressLines>,
    pub is_resolving_address: bool,
    pub last_address_error: Option<AddressError>,
}

impl RequestPhase {
    pub(crate) fn snapshot(&self) -> RequestSnapshot {
        match self {
            RequestPhase::Idle => RequestSnapshot::default(),
            RequestPhase::RequestingPosition => RequestSnapshot {
                is_requesting_position: true,
                ..RequestSnapshot::default()
            },
            RequestPhase::PositionFailed { error } => RequestSnapshot {
                last_position_error: Some(error.clone()),
                ..RequestSnapshot::default()
            },
            RequestPhase::ResolvingAddress { position } => RequestSnapshot {
                position: Some(position.coordinate),
                is_resolving_address: true,
                ..RequestSnapshot::default()
            },
            RequestPhase::AddressResolved { position, address } => RequestSnapshot {
                position: Some(position.coordinate),
                address: Some(address.clone()),
                ..RequestSnapshot::default()
            },
            RequestPhase::AddressFailed { position, error } => RequestSnapshot {
                position: Some(position.coordinate),
                last_address_error: Some(error.clone()),
                ..RequestSnapshot::default()
            },
        }
    }
}
