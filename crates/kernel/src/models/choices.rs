//! Fixed choice sets used by listings and users.
//!
//! Every choice has a stable lowercase token (stored in the database and
//! emitted in JSON) and a display label. Parsing is case-insensitive and
//! accepts the token, the label, or any listed alias.

use serde::Serialize;
use thiserror::Error;

/// A value that does not belong to a choice set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($token:literal, $label:literal) $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Stable token used for storage and JSON.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $token ),+
                }
            }

            /// Human-readable label.
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// `(token, label)` pairs for choice endpoints.
            pub fn choices() -> Vec<Choice> {
                Self::ALL.iter().map(|c| Choice(c.as_str(), c.label())).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($token)
                        || needle.eq_ignore_ascii_case($label)
                        $( || needle.eq_ignore_ascii_case($alias) )*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownChoice {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// A `[token, label]` pair, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice(pub &'static str, pub &'static str);

choice_enum! {
    /// Whether the listing offers the item for sale or for rent.
    AdType as "ad type" {
        Sale => ("sale", "Sale") | "for-sale",
        Rent => ("rent", "Rent") | "for-rent",
    }
}

choice_enum! {
    /// Listing category. Only `Vehicle` carries a specialization record.
    Category as "category" {
        General => ("general", "General"),
        Vehicle => ("vehicle", "Vehicle") | "car",
        Motorcycle => ("motorcycle", "Motorcycle"),
        House => ("house", "House"),
    }
}

choice_enum! {
    City as "city" {
        Belgrade => ("belgrade", "Belgrade") | "beograd",
        NoviSad => ("novi_sad", "Novi Sad"),
        Nis => ("nis", "Niš"),
        Kragujevac => ("kragujevac", "Kragujevac"),
        Subotica => ("subotica", "Subotica"),
        Zrenjanin => ("zrenjanin", "Zrenjanin"),
        Pancevo => ("pancevo", "Pančevo"),
        Cacak => ("cacak", "Čačak"),
        Kraljevo => ("kraljevo", "Kraljevo"),
        NoviPazar => ("novi_pazar", "Novi Pazar"),
        Leskovac => ("leskovac", "Leskovac"),
        Smederevo => ("smederevo", "Smederevo"),
        Valjevo => ("valjevo", "Valjevo"),
        Sabac => ("sabac", "Šabac"),
        Uzice => ("uzice", "Užice"),
    }
}

choice_enum! {
    Manufacturer as "manufacturer" {
        Audi => ("audi", "Audi"),
        Bmw => ("bmw", "BMW"),
        Citroen => ("citroen", "Citroën"),
        Dacia => ("dacia", "Dacia"),
        Fiat => ("fiat", "Fiat"),
        Ford => ("ford", "Ford"),
        Honda => ("honda", "Honda"),
        Hyundai => ("hyundai", "Hyundai"),
        Kia => ("kia", "Kia"),
        Mazda => ("mazda", "Mazda"),
        Mercedes => ("mercedes", "Mercedes-Benz") | "mercedes-benz",
        Nissan => ("nissan", "Nissan"),
        Opel => ("opel", "Opel"),
        Peugeot => ("peugeot", "Peugeot"),
        Renault => ("renault", "Renault"),
        Skoda => ("skoda", "Škoda"),
        Toyota => ("toyota", "Toyota"),
        Volkswagen => ("volkswagen", "Volkswagen") | "vw",
        Volvo => ("volvo", "Volvo"),
        Other => ("other", "Other"),
    }
}

choice_enum! {
    FuelType as "fuel type" {
        Petrol => ("petrol", "Petrol") | "gasoline",
        Diesel => ("diesel", "Diesel"),
        Lpg => ("lpg", "LPG"),
        Electric => ("electric", "Electric"),
        Hybrid => ("hybrid", "Hybrid"),
    }
}

choice_enum! {
    Color as "color" {
        Black => ("black", "Black"),
        White => ("white", "White"),
        Silver => ("silver", "Silver"),
        Gray => ("gray", "Gray") | "grey",
        Red => ("red", "Red"),
        Blue => ("blue", "Blue"),
        Green => ("green", "Green"),
        Yellow => ("yellow", "Yellow"),
        Brown => ("brown", "Brown"),
        Other => ("other", "Other"),
    }
}

choice_enum! {
    /// Vehicle body style.
    BodyType as "body type" {
        Sedan => ("sedan", "Sedan"),
        Hatchback => ("hatchback", "Hatchback"),
        Wagon => ("wagon", "Wagon") | "estate" | "caravan",
        Suv => ("suv", "SUV") | "jeep",
        Coupe => ("coupe", "Coupé"),
        Convertible => ("convertible", "Convertible") | "cabriolet",
        Minivan => ("minivan", "Minivan"),
        Pickup => ("pickup", "Pickup"),
    }
}

choice_enum! {
    #[derive(Default)]
    Role as "role" {
        #[default]
        User => ("user", "User"),
        Admin => ("admin", "Admin"),
        Superadmin => ("superadmin", "Superadmin"),
    }
}

/// All choice sets, as served to clients building filter forms.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceSets {
    pub cities: Vec<Choice>,
    pub ad_types: Vec<Choice>,
    pub categories: Vec<Choice>,
    pub manufacturers: Vec<Choice>,
    pub colors: Vec<Choice>,
    pub car_types: Vec<Choice>,
    pub fuels: Vec<Choice>,
}

impl ChoiceSets {
    pub fn collect() -> Self {
        Self {
            cities: City::choices(),
            ad_types: AdType::choices(),
            categories: Category::choices(),
            manufacturers: Manufacturer::choices(),
            colors: Color::choices(),
            car_types: BodyType::choices(),
            fuels: FuelType::choices(),
        }
    }
}
