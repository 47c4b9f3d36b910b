// Image search and image set management against the ProductAI API.
//
// Expects credentials in ~/.productai/config:
//
//     [DEFAULT]
//     access_key_id = ...
//     access_key_secret = ...
//
// Set RUST_LOG=productai_sdk=debug to see the canonical payload and retries.

use productai_sdk::{Client, ClientConfig, Credentials, DEFAULT_LOC};
use tracing_subscriber::EnvFilter;

const SERVICE_ID: &str = "your-service-id"; // Replace with your search service id
const IMAGE_SET_ID: &str = "your-image-set-id"; // Replace with your image set id
const IMAGE_URL: &str = "https://example.com/images/shoe.jpg";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    println!("ProductAI SDK - Image Search Example");
    println!("====================================");

    let credentials = Credentials::from_file(None, None)?;
    let client = Client::with_config(credentials, ClientConfig::default())?;

    // 1. Search the whole image
    println!("\n1. Image search:");
    match client
        .get_image_search_api(SERVICE_ID)
        .query(IMAGE_URL, DEFAULT_LOC)
    {
        Ok(response) => {
            let status = response.status();
            println!("✓ {}: {}", status, response.text()?);
        }
        Err(e) => println!("⚠ Search failed: {}", e),
    }

    // 2. Search the upper-left quarter only
    println!("\n2. Region search:");
    match client
        .get_image_search_api(SERVICE_ID)
        .query(IMAGE_URL, "0-0-0.5-0.5")
    {
        Ok(response) => println!("✓ {}", response.status()),
        Err(e) => println!("⚠ Search failed: {}", e),
    }

    // 3. Add and remove an image from a set
    println!("\n3. Image set:");
    let image_set = client.get_image_set_api(IMAGE_SET_ID);
    match image_set.add_image(IMAGE_URL, Some("sku-42")) {
        Ok(response) => println!("✓ Add image: {}", response.status()),
        Err(e) => println!("⚠ Add image failed: {}", e),
    }
    match image_set.delete_images(&[IMAGE_URL]) {
        Ok(response) => println!("✓ Delete images: {}", response.status()),
        Err(e) => println!("⚠ Delete images failed: {}", e),
    }

    Ok(())
}
