//! Canonical field shapes shared across schemas

use crate::schema::{FieldDefinition, FieldType, NamedField};

/// Markers appended to a converted schema's top-level fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// The entity must not be associated with a route
    NoRoute,
    /// The entity must not be associated with a service
    NoService,
    /// The entity must not be associated with a consumer
    NoConsumer,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::NoRoute, Marker::NoService, Marker::NoConsumer];

    /// Key that declares this marker on a legacy schema root
    pub fn legacy_key(&self) -> &'static str {
        match self {
            Marker::NoRoute => "no_route",
            Marker::NoService => "no_service",
            Marker::NoConsumer => "no_consumer",
        }
    }
}

/// Library of field definitions referenced by name during conversion
pub trait CanonicalFields {
    /// Definition substituted for every legacy `timestamp` field
    fn timestamp(&self) -> FieldDefinition;

    /// Top-level field expressing a marker
    fn marker(&self, marker: Marker) -> NamedField;
}

/// The stock field library
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypedefs;

impl CanonicalFields for StandardTypedefs {
    fn timestamp(&self) -> FieldDefinition {
        let mut field = FieldDefinition::new(FieldType::Number { timestamp: true });
        field.auto = Some(true);
        field
    }

    fn marker(&self, marker: Marker) -> NamedField {
        let (name, reference) = match marker {
            Marker::NoRoute => ("route", "routes"),
            Marker::NoService => ("service", "services"),
            Marker::NoConsumer => ("consumer", "consumers"),
        };
        NamedField::new(
            name,
            FieldDefinition::new(FieldType::Foreign {
                reference: reference.to_string(),
                forbidden: true,
            }),
        )
    }
}
