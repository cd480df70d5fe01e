use berkas_core::error::BerkasError;
use berkas_core::verdict::VerificationVerdict;

pub fn print(verdicts: &[VerificationVerdict]) -> Result<(), BerkasError> {
    let json = serde_json::to_string_pretty(verdicts)?;
    println!("{json}");
    Ok(())
}
