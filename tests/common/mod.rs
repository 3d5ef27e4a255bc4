// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sieve::descriptor::ScalarType;
use sieve::{Descriptor, Entity, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active = 1,
    Pending = 2,
    Closed = 3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub name: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub status: Status,
    pub archived: bool,
    pub score: Option<f64>,
    pub balance: Decimal,
    pub ratio: f32,
    pub nickname: Option<String>,
    pub address: Address,
    pub employer: Option<Company>,
}

impl Entity for Address {
    fn descriptor() -> &'static Descriptor<Self> {
        static DESCRIPTOR: Lazy<Descriptor<Address>> = Lazy::new(|| {
            Descriptor::builder("Address")
                .field("City", FieldType::STRING, |a: &Address| a.city.clone())
                .field("Zip", FieldType::STRING.nullable(), |a: &Address| {
                    a.zip.clone()
                })
                .build()
        });
        &DESCRIPTOR
    }
}

impl Entity for Company {
    fn descriptor() -> &'static Descriptor<Self> {
        static DESCRIPTOR: Lazy<Descriptor<Company>> = Lazy::new(|| {
            Descriptor::builder("Company")
                .field("Name", FieldType::STRING, |c: &Company| c.name.clone())
                .field("Size", FieldType::U32, |c: &Company| c.size)
                .build()
        });
        &DESCRIPTOR
    }
}

impl Entity for Person {
    fn descriptor() -> &'static Descriptor<Self> {
        static DESCRIPTOR: Lazy<Descriptor<Person>> = Lazy::new(|| {
            Descriptor::builder("Person")
                .field("Name", FieldType::STRING, |p: &Person| p.name.clone())
                .field("Age", FieldType::I32, |p: &Person| p.age)
                .field(
                    "Status",
                    FieldType::enumeration("Status", ScalarType::I32),
                    |p: &Person| p.status as i32,
                )
                .field("Archived", FieldType::BOOL, |p: &Person| p.archived)
                .field("Score", FieldType::F64.nullable(), |p: &Person| p.score)
                .field("Balance", FieldType::DECIMAL, |p: &Person| p.balance)
                .field("Ratio", FieldType::F32, |p: &Person| p.ratio)
                .field("Nickname", FieldType::STRING.nullable(), |p: &Person| {
                    p.nickname.clone()
                })
                .nested("Address", |p: &Person| &p.address, Address::descriptor())
                .nested_optional(
                    "Employer",
                    |p: &Person| p.employer.as_ref(),
                    Company::descriptor(),
                )
                .build()
        });
        &DESCRIPTOR
    }
}

pub fn person(name: &str, age: i32) -> Person {
    Person {
        name: name.to_string(),
        age,
        status: Status::Active,
        archived: false,
        score: None,
        balance: Decimal::ZERO,
        ratio: 0.5,
        nickname: None,
        address: Address {
            city: "Oslo".to_string(),
            zip: None,
        },
        employer: None,
    }
}

/// Five people with distinct names and a mix of ages, cities and statuses.
pub fn people() -> Vec<Person> {
    let mut john = person("John", 41);
    john.score = Some(88.5);
    john.employer = Some(Company {
        name: "Acme".to_string(),
        size: 120,
    });

    let mut jane = person("Jane", 29);
    jane.status = Status::Pending;
    jane.address.city = "Bergen".to_string();
    jane.score = Some(92.0);

    let mut joan = person("Joan", 41);
    joan.archived = true;
    joan.nickname = Some("Jo".to_string());

    let mut bob = person("Bob", 35);
    bob.status = Status::Closed;
    bob.balance = Decimal::new(125050, 2);
    bob.address.city = "Bergen".to_string();

    let alice = person("Alice", 23);

    vec![john, jane, joan, bob, alice]
}

pub fn names(people: &[Person]) -> Vec<&str> {
    people.iter().map(|p| p.name.as_str()).collect()
}
