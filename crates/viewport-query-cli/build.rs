fn main() -> Result<(), shadow_rs::ShadowError> {
    shadow_rs::ShadowBuilder::builder().build()?;
    Ok(())
}
