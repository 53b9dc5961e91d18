use rand::distr::Alphanumeric;
use rand::Rng;

/// Random token mailed to new accounts for e-mail confirmation.
pub fn generate_verification_token() -> String {
    let mut rng = rand::rng();
    (0..32)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}
