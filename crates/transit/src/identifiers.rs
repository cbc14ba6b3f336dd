//! Identifiers handed out by the data backend.
//!
//! Stop and vehicle ids are opaque strings that get cloned into every index,
//! route path and status snapshot, so they share one `Arc<str>` allocation.
//! Both kinds borrow as `str`, which lets maps keyed by them be queried with a
//! plain string slice.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! shared_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(Arc::from(id))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }

        impl From<Arc<str>> for $name {
            fn from(id: Arc<str>) -> Self {
                Self(id)
            }
        }

        // Bare string on the wire, matching the backend rows
        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                <String as serde::Deserialize>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

shared_identifier!(
    /// Key of a stop, unique within one stop generation
    StopIdentifier
);
shared_identifier!(
    /// Key of a vehicle as it appears in position reports
    VehicleIdentifier
);

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use super::*;

    #[test]
    fn test_clones_share_the_allocation() {
        let id = StopIdentifier::new("paradero_12");
        let copy = id.clone();

        assert_eq!(id, copy);
        assert_eq!(id, StopIdentifier::new("paradero_12"));
        assert!(Arc::ptr_eq(&id.0, &copy.0));
    }

    #[test]
    fn test_fleet_map_lookup_by_str() {
        let mut fleet = HashMap::new();
        fleet.insert(VehicleIdentifier::new("bus_1"), "Ruta Norte");

        assert_eq!(fleet.get("bus_1"), Some(&"Ruta Norte"));
        assert_eq!(fleet.get("bus_2"), None);
    }

    #[test]
    fn test_stops_order_by_id_text() {
        let ids: BTreeSet<StopIdentifier> =
            ["p10", "p2", "p1"].into_iter().map(Into::into).collect();
        let ordered: Vec<&str> = ids.iter().map(StopIdentifier::as_str).collect();

        assert_eq!(ordered, ["p1", "p10", "p2"]);
    }

    #[test]
    fn test_display_is_the_raw_id() {
        let id = VehicleIdentifier::from(String::from("bus_7"));
        assert_eq!(id.to_string(), "bus_7");
        assert_eq!(format!("vehicle {id}"), "vehicle bus_7");
    }

    #[test]
    fn test_wraps_existing_allocation() {
        let raw: Arc<str> = Arc::from("comedor");
        let id = StopIdentifier::from(Arc::clone(&raw));
        assert!(Arc::ptr_eq(&id.0, &raw));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_wire_format_is_a_plain_string() {
        let id: StopIdentifier = serde_json::from_str(r#""puerta""#).unwrap();
        assert_eq!(id.as_str(), "puerta");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""puerta""#);

        assert!(serde_json::from_str::<VehicleIdentifier>("17").is_err());
    }
}
