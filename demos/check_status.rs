use std::time::Duration;

use sinch_sms::MessageId;

mod env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env::init_tracing();

    let id = MessageId::new(env::required("SINCH_MESSAGE_ID")?.trim().parse()?);
    let client = env::client()?;

    loop {
        let status = client.check_status(id).await?;
        println!("status of {id}: {status}");
        if !status.is_pending() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    Ok(())
}
