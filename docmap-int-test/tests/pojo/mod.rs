#![allow(dead_code)]

use chrono::{DateTime, Utc};
use docmap::collection::ObjectId;
use docmap_derive::{DocEnum, Entity};

pub const PET_COLLECTION: &str = "pet";

#[derive(Debug, Clone, Copy, PartialEq, Default, DocEnum)]
#[mo(rename_all = "UPPERCASE")]
pub enum PetType {
    #[default]
    Cat,
    Dog,
    Hamster,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, DocEnum)]
#[mo(rename_all = "UPPERCASE")]
pub enum PetColor {
    #[default]
    White,
    Black,
    Blue,
}

#[derive(Debug, Clone, PartialEq, Default, Entity)]
pub struct Human {
    #[mo(key = "nm")]
    pub name: String,
}

impl Human {
    pub fn named(name: &str) -> Self {
        Human {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Entity)]
pub struct Pet {
    #[mo(id)]
    pub id: String,
    #[mo(key = "nm")]
    pub name: String,
    pub age: i32,
    #[mo(key = "tp", converter = "enum")]
    pub pet_type: PetType,
    #[mo(converter = "enum")]
    pub color: PetColor,
    #[mo(key = "born")]
    pub born_at: Option<DateTime<Utc>>,
    #[mo(converter = "nested")]
    pub master: Option<Human>,
    pub labels: Option<Vec<String>>,
    #[mo(key = "frs")]
    pub friends: Vec<ObjectId>,
    #[mo(ignore)]
    pub comment: Option<String>,
}

impl Pet {
    pub fn named(name: &str) -> Self {
        Pet {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn all(names: &[&str]) -> Vec<Pet> {
        names.iter().map(|n| Pet::named(n)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Entity)]
#[mo(name = "PetOwner")]
pub struct Pet2 {
    #[mo(id)]
    pub id: Option<ObjectId>,
    #[mo(key = "nm")]
    pub name: String,
    pub age: i32,
    #[mo(converter = "nested_array")]
    pub pets: Vec<Pet>,
}
