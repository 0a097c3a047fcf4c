mod env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env::init_tracing();

    let to = env::required("SINCH_TO")?;
    let from = env::optional("SINCH_FROM", "");
    let message = env::optional("SINCH_MESSAGE", "Hello from the sinch-sms demo.");

    let client = env::client()?;
    let id = client.send(&from, &to, &message).await?;
    tracing::info!(%id, %to, "message accepted");
    println!("message id: {id}");

    Ok(())
}
