use serde::{Deserialize, Serialize};

use chargebook_core::{Currency, CustomerId, DomainError, DomainResult};

/// A billed customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Currency the customer's account is held in.
    pub currency: Currency,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Request: create a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCreateRequest {
    pub name: String,
    pub currency: Currency,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl CustomerCreateRequest {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        validate_email(&self.email)
    }
}

/// Request: partially update a customer. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdateRequest {
    pub id: CustomerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl CustomerUpdateRequest {
    pub fn new(id: CustomerId) -> Self {
        Self {
            id,
            name: None,
            currency: None,
            email: None,
            phone_number: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    /// Apply the present fields onto `customer`.
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(currency) = self.currency {
            customer.currency = currency;
        }
        if let Some(email) = &self.email {
            customer.email = email.clone();
        }
        if let Some(phone) = &self.phone_number {
            customer.phone_number = Some(phone.clone());
        }
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("customer name must not be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::validation("customer email must not be empty"));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("customer email must contain '@'"));
    }
    Ok(())
}
