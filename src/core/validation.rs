use crate::core::errors::WarikanError;

pub fn validate_string_input(field: &str, value: &str, max_length: usize) -> Result<(), WarikanError> {
    if value.trim().is_empty() {
        return Err(WarikanError::invalid_input(
            field,
            format!("Invalid {}", field),
            format!("{} cannot be blank", field),
        ));
    }
    if value.chars().count() > max_length {
        return Err(WarikanError::invalid_input(
            field,
            format!("{} Too Long", field),
            format!("{} cannot exceed {} characters", field, max_length),
        ));
    }
    if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
        return Err(WarikanError::invalid_input(
            field,
            format!("Invalid {}", field),
            format!("{} contains invalid characters", field),
        ));
    }
    Ok(())
}

pub fn validate_positive_amount(field: &str, amount: i64) -> Result<(), WarikanError> {
    if amount <= 0 {
        return Err(WarikanError::invalid_input(
            field,
            "Invalid Amount",
            "Amount must be greater than 0",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), WarikanError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid || email.len() > crate::constants::MAX_EMAIL_LENGTH {
        return Err(WarikanError::InvalidEmail(email.to_string()));
    }
    Ok(())
}
