use rand::Rng;

pub const CONFIRMATION_CODE_LEN: usize = 6;

/// A fresh numeric confirmation code, e.g. `"042917"`.
pub fn generate_confirmation_code() -> String {
    let mut rng = rand::rng();
    (0..CONFIRMATION_CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
