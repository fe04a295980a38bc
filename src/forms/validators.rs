//! Field validators for Brazilian documents and contact data.

pub const MSG_REQUIRED: &str = "Campo obrigatório";
pub const MSG_INVALID_CPF: &str = "CPF inválido";
pub const MSG_INVALID_CNPJ: &str = "CNPJ inválido";
pub const MSG_INVALID_CEP: &str = "CEP inválido";
pub const MSG_INVALID_EMAIL: &str = "E-mail inválido";
pub const MSG_INVALID_PHONE: &str = "Telefone inválido";
pub const MSG_SHORT_PASSWORD: &str = "A senha deve ter ao menos 6 caracteres";

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn digits_of(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Mod-11 check digit over `digits` with the given weights.
fn check_digit(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 {
        0
    } else {
        11 - rest
    }
}

/// Accepts formatted (`529.982.247-25`) or bare CPFs.
pub fn is_valid_cpf(value: &str) -> bool {
    let digits = digits_of(&only_digits(value));
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }
    let first = check_digit(&digits[..9], (2..=10).rev());
    let second = check_digit(&digits[..10], (2..=11).rev());
    digits[9] == first && digits[10] == second
}

pub fn is_valid_cnpj(value: &str) -> bool {
    let digits = digits_of(&only_digits(value));
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }
    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let first = check_digit(&digits[..12], FIRST.into_iter());
    let second = check_digit(&digits[..13], SECOND.into_iter());
    digits[12] == first && digits[13] == second
}

/// Eight digits, hyphen optional. Returns the bare digits.
pub fn normalize_cep(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == '.')
    {
        return None;
    }
    let digits = only_digits(trimmed);
    (digits.len() == 8).then_some(digits)
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Landline (10 digits) or mobile (11 digits) with area code.
pub fn is_valid_phone(value: &str) -> bool {
    matches!(only_digits(value).len(), 10 | 11)
}
