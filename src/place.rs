//! Places, structured locations and postal addresses.

use crate::handle::Handle;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};

/// Jurisdiction levels a place title can be split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    /// Street or address line
    Street,
    /// Parish
    Parish,
    /// City, town or village
    City,
    /// County
    County,
    /// State or province
    State,
    /// Country
    Country,
    /// Postal code
    PostalCode,
    /// Phone (kept for address-form completeness)
    Phone,
}

impl Jurisdiction {
    /// Interpret one entry of a `PLAC.FORM` list (`City, County, State, Country`).
    #[must_use]
    pub fn from_form_entry(entry: &str) -> Option<Self> {
        let level = match entry.trim().to_ascii_lowercase().as_str() {
            "street" | "address" | "addr" => Jurisdiction::Street,
            "parish" => Jurisdiction::Parish,
            "city" | "town" | "village" | "hamlet" | "place" | "locality" => Jurisdiction::City,
            "county" | "district" => Jurisdiction::County,
            "state" | "province" | "region" => Jurisdiction::State,
            "country" | "nation" => Jurisdiction::Country,
            "postal code" | "zip" | "zip code" | "postcode" => Jurisdiction::PostalCode,
            "phone" => Jurisdiction::Phone,
            _ => return None,
        };
        Some(level)
    }
}

/// Default place hierarchy when the file declares no `PLAC.FORM`.
pub const DEFAULT_PLACE_FORM: [Jurisdiction; 4] = [
    Jurisdiction::City,
    Jurisdiction::County,
    Jurisdiction::State,
    Jurisdiction::Country,
];

/// A structured location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Street
    pub street: String,
    /// Parish
    pub parish: String,
    /// City
    pub city: String,
    /// County
    pub county: String,
    /// State or province
    pub state: String,
    /// Country
    pub country: String,
    /// Postal code
    pub postal: String,
    /// Phone
    pub phone: String,
}

impl Location {
    /// Mutable access to the field for one jurisdiction level.
    pub fn field_mut(&mut self, level: Jurisdiction) -> &mut String {
        match level {
            Jurisdiction::Street => &mut self.street,
            Jurisdiction::Parish => &mut self.parish,
            Jurisdiction::City => &mut self.city,
            Jurisdiction::County => &mut self.county,
            Jurisdiction::State => &mut self.state,
            Jurisdiction::Country => &mut self.country,
            Jurisdiction::PostalCode => &mut self.postal,
            Jurisdiction::Phone => &mut self.phone,
        }
    }

    /// Split a comma-separated place title according to `form`.
    ///
    /// Components are matched right to left so that a short title such as
    /// `"Ohio, USA"` lands in state and country. Components beyond the form's
    /// length are ignored; unrecognised form entries leave their slot empty.
    #[must_use]
    pub fn from_title(title: &str, form: &[Option<Jurisdiction>]) -> Self {
        let mut location = Location::default();
        let parts: Vec<&str> = title.split(',').map(str::trim).collect();
        for (part, level) in parts.iter().rev().zip(form.iter().rev()) {
            if let Some(level) = level {
                if !part.is_empty() {
                    *location.field_mut(*level) = (*part).to_string();
                }
            }
        }
        location
    }

    /// Whether no field is filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Location::default()
    }
}

/// A place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`P0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Full title as written in the file
    pub title: String,
    /// Structured location
    pub location: Location,
    /// Alternate locations
    pub alt_locations: Vec<Location>,
    /// Latitude (MAP.LATI)
    pub latitude: String,
    /// Longitude (MAP.LONG)
    pub longitude: String,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Place {
    /// Create a place with only a title.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>, title: impl Into<String>) -> Self {
        Place {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            title: title.into(),
            location: Location::default(),
            alt_locations: Vec::new(),
            latitude: String::new(),
            longitude: String::new(),
            citations: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// A postal address (`ADDR` structure).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    /// Address text: the `ADDR` value plus `ADR1`-`ADR3` lines
    pub street: String,
    /// City
    pub city: String,
    /// State
    pub state: String,
    /// Postal code
    pub postal: String,
    /// Country
    pub country: String,
    /// Phone (PHON)
    pub phone: String,
    /// Date of residence, as text
    pub date_text: String,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Address {
    /// Append one address line to the street text.
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if !self.street.is_empty() {
            self.street.push('\n');
        }
        self.street.push_str(line);
    }

    /// Whether nothing is filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.street.is_empty()
            && self.city.is_empty()
            && self.state.is_empty()
            && self.postal.is_empty()
            && self.country.is_empty()
            && self.phone.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_form() -> Vec<Option<Jurisdiction>> {
        DEFAULT_PLACE_FORM.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_location_from_full_title() {
        let loc = Location::from_title("Springfield, Sangamon, Illinois, USA", &default_form());
        assert_eq!(loc.city, "Springfield");
        assert_eq!(loc.county, "Sangamon");
        assert_eq!(loc.state, "Illinois");
        assert_eq!(loc.country, "USA");
    }

    #[test]
    fn test_location_short_title_aligns_right() {
        let loc = Location::from_title("Ohio, USA", &default_form());
        assert_eq!(loc.state, "Ohio");
        assert_eq!(loc.country, "USA");
        assert!(loc.city.is_empty());
    }

    #[test]
    fn test_location_custom_form() {
        let form: Vec<Option<Jurisdiction>> = "Parish, County, Country"
            .split(',')
            .map(Jurisdiction::from_form_entry)
            .collect();
        let loc = Location::from_title("St Mary, Kent, England", &form);
        assert_eq!(loc.parish, "St Mary");
        assert_eq!(loc.county, "Kent");
        assert_eq!(loc.country, "England");
    }

    #[test]
    fn test_address_lines() {
        let mut addr = Address::default();
        assert!(addr.is_empty());
        addr.push_line("1 Main St");
        addr.push_line("  ");
        addr.push_line("Apt 2");
        assert_eq!(addr.street, "1 Main St\nApt 2");
    }
}
