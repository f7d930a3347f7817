pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (bg, now) = super::offline_service()?;
    let status = bg.status(now)?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
