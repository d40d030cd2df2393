use serde::{Deserialize, Serialize};

use shopledger_core::{CustomerId, DomainResult, Entity, ValueObject};

use crate::contact::{Address, Email, Phone};

/// A shop customer.
///
/// Contact details are validated on construction and on every assignment, so
/// a `Customer` value is never half-valid. A rejected assignment leaves the
/// previous value in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: Option<CustomerId>,
    first_name: String,
    last_name: String,
    email: Email,
    phone: Phone,
    address: Address,
}

impl Customer {
    /// Validate and build a customer that has not been persisted yet.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: Email::parse(email)?,
            phone: Phone::parse(phone)?,
            address: Address::parse(address)?,
        })
    }

    /// Validate and build a customer with a known identity (e.g. read back
    /// from the store).
    pub fn with_id(
        id: CustomerId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> DomainResult<Self> {
        let mut customer = Self::new(first_name, last_name, email, phone, address)?;
        customer.id = Some(id);
        Ok(customer)
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> &Phone {
        &self.phone
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// `"First Last"`, as shown in listings and reports.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.first_name = value.into();
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.last_name = value.into();
    }

    pub fn set_email(&mut self, value: impl Into<String>) -> DomainResult<()> {
        self.email = Email::parse(value)?;
        Ok(())
    }

    pub fn set_phone(&mut self, value: impl Into<String>) -> DomainResult<()> {
        self.phone = Phone::parse(value)?;
        Ok(())
    }

    pub fn set_address(&mut self, value: impl Into<String>) -> DomainResult<()> {
        self.address = Address::parse(value)?;
        Ok(())
    }

    /// Case-insensitive substring match over every text field.
    ///
    /// An empty (or whitespace-only) query matches everyone.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.address.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> Option<CustomerId> {
        self.id
    }

    fn id_slot(&mut self) -> &mut Option<CustomerId> {
        &mut self.id
    }
}

impl core::fmt::Display for Customer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.id {
            Some(id) => write!(f, "Customer {id}: {} {}", self.first_name, self.last_name),
            None => write!(f, "Customer (new): {} {}", self.first_name, self.last_name),
        }
    }
}
