//! Structural email address check (`local@domain.tld`), close to what
//! mainstream form validators accept. No DNS or deliverability lookups.

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_LABEL_LEN: usize = 63;

/// Describe why `address` is not a valid email, or `None` if it is.
pub fn email_problem(address: &str) -> Option<&'static str> {
    if address.is_empty() {
        return Some("value is empty");
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Some("address is too long");
    }
    let Some((local, domain)) = address.rsplit_once('@') else {
        return Some("the email address must have an @-sign");
    };
    if local.is_empty() {
        return Some("there must be something before the @-sign");
    }
    if domain.is_empty() {
        return Some("there must be something after the @-sign");
    }
    if local.len() > MAX_LOCAL_LEN {
        return Some("the part before the @-sign is too long");
    }
    if !local.chars().all(is_local_char) {
        return Some("the part before the @-sign contains invalid characters");
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Some("the part before the @-sign has a misplaced period");
    }
    domain_problem(domain)
}

pub fn is_valid_email(address: &str) -> bool {
    email_problem(address).is_none()
}

/// Strip surrounding whitespace and a `Display Name <addr>` wrapper.
pub fn bare_address(input: &str) -> &str {
    let input = input.trim();
    match input.strip_suffix('>').and_then(|rest| rest.rsplit_once('<')) {
        Some((_, inner)) => inner.trim(),
        None => input,
    }
}

/// Printable non-ASCII text, as allowed by SMTPUTF8 addresses and IDN domains.
fn is_international(c: char) -> bool {
    !c.is_ascii() && !c.is_whitespace() && !c.is_control()
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-.".contains(c) || is_international(c)
}

fn domain_problem(domain: &str) -> Option<&'static str> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Some("the domain name must contain a period");
    }
    for label in &labels {
        if label.is_empty() {
            return Some("the domain name has a misplaced period");
        }
        if label.len() > MAX_LABEL_LEN {
            return Some("a domain label is too long");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || is_international(c)) {
            return Some("the domain name contains invalid characters");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Some("a domain label cannot start or end with a hyphen");
        }
    }
    let tld = labels[labels.len() - 1];
    if tld.chars().all(|c| c.is_ascii_digit()) {
        return Some("the top-level domain cannot be numeric");
    }
    None
}
