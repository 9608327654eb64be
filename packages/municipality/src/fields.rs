//! Declarative field table: logical attribute → candidate raw keys → parser.
//!
//! Source records spell the same attribute several ways. Each [`Field`]
//! lists its raw keys in priority order; the first key whose value parses
//! wins. Defaults live with the resolver since some depend on the
//! municipality type.

use muni_budget_topology::PropertyBag;
use serde_json::Value;

use crate::parsing;

/// One logical attribute and where to find it.
#[derive(Debug, Clone, Copy)]
pub struct Field<T: 'static> {
    /// Logical name, for logging.
    pub name: &'static str,
    /// Raw keys, tried in order.
    pub keys: &'static [&'static str],
    /// Parser applied to each candidate value.
    pub parse: fn(&Value) -> Option<T>,
}

impl<T> Field<T> {
    /// Returns the first candidate value that parses.
    #[must_use]
    pub fn lookup(&self, properties: &PropertyBag) -> Option<T> {
        self.keys
            .iter()
            .filter_map(|key| properties.get(*key))
            .find_map(|value| (self.parse)(value))
    }

    /// Whether any candidate key is present, parseable or not.
    #[must_use]
    pub fn is_present(&self, properties: &PropertyBag) -> bool {
        self.keys.iter().any(|key| properties.contains_key(*key))
    }
}

pub const NAME: Field<String> = Field {
    name: "name",
    keys: &["name", "mun_name"],
    parse: parsing::text,
};

pub const IDENTIFIER: Field<String> = Field {
    name: "identifier",
    keys: &["muni_code", "id"],
    parse: parsing::text,
};

pub const PROVINCE: Field<String> = Field {
    name: "province",
    keys: &["cwt_name", "province"],
    parse: parsing::text,
};

pub const DISTRICT: Field<String> = Field {
    name: "district",
    keys: &["amp_name", "district"],
    parse: parsing::text,
};

pub const TYPE: Field<String> = Field {
    name: "type",
    keys: &["type", "check-extracted-data - all-muni-nso-thai_type"],
    parse: parsing::text,
};

/// Total budget, published in millions of baht.
pub const BUDGET: Field<f64> = Field {
    name: "budget",
    keys: &["1- clean-extracted_46_to_235_total"],
    parse: parsing::amount,
};

pub const POPULATION: Field<u64> = Field {
    name: "population",
    keys: &["1- clean-extracted_46_to_235_poppu"],
    parse: parsing::count,
};

/// Land area in square kilometers.
pub const AREA: Field<f64> = Field {
    name: "area",
    keys: &["1- clean-extracted_46_to_235_land-sque-km"],
    parse: parsing::amount,
};

pub const SELF_COLLECTED: Field<f64> = Field {
    name: "self_collected",
    keys: &["จัดเก็บเอง (ล้านบาท)"],
    parse: parsing::millions,
};

pub const STATE_ALLOCATED: Field<f64> = Field {
    name: "state_allocated",
    keys: &["รัฐจัดสรร (ล้านบาท)"],
    parse: parsing::millions,
};

pub const SUBSIDIES: Field<f64> = Field {
    name: "subsidies",
    keys: &["เงินอุดหนุน (ล้านบาท)"],
    parse: parsing::millions,
};
