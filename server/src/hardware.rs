//! Construction components a reed references but does not own: the
//! wrapping thread and the staple (tube).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BackendError;

/// The tube material. A closed set; unknown values are rejected at the
/// request boundary.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StapleMaterial {
    Brass,
    NickelSilver,
    Silver,
    Other,
}

impl StapleMaterial {
    pub fn as_str(&self) -> &'static str {
        match self {
            StapleMaterial::Brass => "brass",
            StapleMaterial::NickelSilver => "nickel_silver",
            StapleMaterial::Silver => "silver",
            StapleMaterial::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "brass" => Some(StapleMaterial::Brass),
            "nickel_silver" => Some(StapleMaterial::NickelSilver),
            "silver" => Some(StapleMaterial::Silver),
            "other" => Some(StapleMaterial::Other),
            _ => None,
        }
    }

    /// The human-readable form used when synthesizing reed names.
    pub fn display(&self) -> &'static str {
        match self {
            StapleMaterial::Brass => "Brass",
            StapleMaterial::NickelSilver => "Nickel Silver",
            StapleMaterial::Silver => "Silver",
            StapleMaterial::Other => "Other",
        }
    }
}

/// The opening shape of the staple.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StapleShape {
    Oval,
    Round,
    Recessed,
    Other,
}

impl StapleShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            StapleShape::Oval => "oval",
            StapleShape::Round => "round",
            StapleShape::Recessed => "recessed",
            StapleShape::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "oval" => Some(StapleShape::Oval),
            "round" => Some(StapleShape::Round),
            "recessed" => Some(StapleShape::Recessed),
            "other" => Some(StapleShape::Other),
            _ => None,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            StapleShape::Oval => "Oval",
            StapleShape::Round => "Round",
            StapleShape::Recessed => "Recessed",
            StapleShape::Other => "Other",
        }
    }
}

/// A wrapping-thread descriptor.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Thread {
    pub id: Uuid,
    pub color: String,
    pub gauge: Option<String>,
}

impl Thread {
    /// The label used when synthesizing a reed name: `"<color>"` or
    /// `"<color> (<gauge>)"`.
    pub fn label(&self) -> String {
        match &self.gauge {
            Some(gauge) => format!("{} ({})", self.color, gauge),
            None => self.color.clone(),
        }
    }
}

/// The client-submitted fields of a thread. Doubles as the column
/// values for inserts and full updates.
#[derive(Clone, Debug, Deserialize)]
pub struct ThreadFields {
    pub color: String,

    #[serde(default)]
    pub gauge: Option<String>,
}

impl ThreadFields {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.color.trim().is_empty() {
            return Err(BackendError::validation("color", "color must not be blank"));
        }

        Ok(())
    }
}

/// A partial update to a thread.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ThreadPatch {
    pub color: Option<String>,
    pub gauge: Option<String>,
}

impl ThreadPatch {
    pub fn apply(self, current: &Thread) -> ThreadFields {
        ThreadFields {
            color: self.color.unwrap_or_else(|| current.color.clone()),
            gauge: self.gauge.or_else(|| current.gauge.clone()),
        }
    }
}

/// A staple (tube) descriptor. `quantity` is a display multiplier, not
/// per-unit inventory.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Staple {
    pub id: Uuid,
    pub material: StapleMaterial,
    pub shape: StapleShape,
    pub manufacturer: Option<String>,
    pub length_mm: Option<f64>,
    pub quantity: i32,
}

impl Staple {
    /// The label used when synthesizing a reed name, e.g. `"Recessed Brass"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.shape.display(), self.material.display())
    }
}

fn default_quantity() -> i32 {
    1
}

/// The client-submitted fields of a staple. Also the payload of the
/// bulk-create operation, which stores a single row carrying `quantity`.
#[derive(Clone, Debug, Deserialize)]
pub struct StapleFields {
    pub material: StapleMaterial,
    pub shape: StapleShape,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub length_mm: Option<f64>,

    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl StapleFields {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.quantity < 1 {
            return Err(BackendError::validation(
                "quantity",
                format!("quantity must be at least 1, got {}", self.quantity),
            ));
        }

        if let Some(length) = self.length_mm {
            if length <= 0.0 {
                return Err(BackendError::validation(
                    "length_mm",
                    "length must be positive",
                ));
            }
        }

        Ok(())
    }
}

/// A partial update to a staple.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StaplePatch {
    pub material: Option<StapleMaterial>,
    pub shape: Option<StapleShape>,
    pub manufacturer: Option<String>,
    pub length_mm: Option<f64>,
    pub quantity: Option<i32>,
}

impl StaplePatch {
    pub fn apply(self, current: &Staple) -> StapleFields {
        StapleFields {
            material: self.material.unwrap_or(current.material),
            shape: self.shape.unwrap_or(current.shape),
            manufacturer: self.manufacturer.or_else(|| current.manufacturer.clone()),
            length_mm: self.length_mm.or(current.length_mm),
            quantity: self.quantity.unwrap_or(current.quantity),
        }
    }
}

/// Synthesizes the display name of a reed created without one:
/// `"<thread label> / <staple label>"`. Derived once, at creation.
pub fn derived_name(thread: &Thread, staple: &Staple) -> String {
    format!("{} / {}", thread.label(), staple.label())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn thread(color: &str, gauge: Option<&str>) -> Thread {
        Thread {
            id: Uuid::new_v4(),
            color: color.to_owned(),
            gauge: gauge.map(str::to_owned),
        }
    }

    fn staple(material: StapleMaterial, shape: StapleShape) -> Staple {
        Staple {
            id: Uuid::new_v4(),
            material,
            shape,
            manufacturer: None,
            length_mm: Some(47.0),
            quantity: 1,
        }
    }

    #[test]
    fn thread_labels_include_gauge_when_present() {
        assert_eq!(thread("Blue", None).label(), "Blue");
        assert_eq!(thread("Blue", Some("FF")).label(), "Blue (FF)");
    }

    #[test]
    fn derived_names_join_thread_and_staple_labels() {
        let name = derived_name(
            &thread("Turquoise", Some("FF")),
            &staple(StapleMaterial::Brass, StapleShape::Recessed),
        );

        assert_eq!(name, "Turquoise (FF) / Recessed Brass");
    }

    #[test]
    fn nickel_silver_displays_with_a_space() {
        let staple = staple(StapleMaterial::NickelSilver, StapleShape::Oval);
        assert_eq!(staple.label(), "Oval Nickel Silver");
    }

    #[test]
    fn quantity_below_one_is_rejected() {
        let fields = StapleFields {
            material: StapleMaterial::Brass,
            shape: StapleShape::Oval,
            manufacturer: None,
            length_mm: None,
            quantity: 0,
        };

        match fields.validate() {
            Err(crate::errors::BackendError::Validation { field, .. }) => {
                assert_eq!(field, "quantity")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_enumeration_values_fail_to_deserialize() {
        let result = serde_json::from_str::<StapleFields>(
            r#"{"material": "adamantium", "shape": "oval"}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn material_round_trips_through_strings() {
        for material in &[
            StapleMaterial::Brass,
            StapleMaterial::NickelSilver,
            StapleMaterial::Silver,
            StapleMaterial::Other,
        ] {
            assert_eq!(StapleMaterial::parse(material.as_str()), Some(*material));
        }

        assert_eq!(StapleMaterial::parse("brass "), None);
    }
}
