use crate::{Res, info};

/// Prints the id of the signed in user.
pub async fn me() -> Res<()> {
    let mut client = super::connect().await?;
    let user_id = client.get_user_id().await?;
    super::save_credential(&mut client).await?;

    info!("Signed in as {}", user_id);
    Ok(())
}
