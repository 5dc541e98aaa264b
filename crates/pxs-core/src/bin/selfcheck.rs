use pxs_core::{init_tracing, AppConfig};
use pxs_models::{Feature, TierLevel};
use pxs_supabase::SupabaseClient;
use pxs_upscale_client::UpscaleClient;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    println!(
        "pxs-selfcheck: starting with site={} upscale={} supabase={}",
        config.site_origin, config.upscale.base_url, config.supabase.url
    );

    print_catalog();

    let upscale_ok = UpscaleClient::new(config.upscale.clone())?
        .health_check()
        .await?;
    report("upscale service", upscale_ok);

    let supabase_ok = match SupabaseClient::new(config.supabase.clone())?.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            error!("Supabase health check error: {}", e);
            false
        }
    };
    report("supabase", supabase_ok);

    if !(upscale_ok && supabase_ok) {
        return Err(anyhow::anyhow!("one or more backends are unreachable"));
    }

    println!("pxs-selfcheck: ok");
    Ok(())
}

fn print_catalog() {
    println!("{:<10} {:>6} {:>8} {:>6} {:>6}", "tier", "scale", "credits", "batch", "speed");
    for tier in TierLevel::ALL {
        let b = tier.benefits();
        println!(
            "{:<10} {:>6} {:>8} {:>6} {:>5}x",
            tier.as_str(),
            b.max_upscale.to_string(),
            b.credit_grant,
            b.batch_limit,
            b.speed_multiplier
        );
    }

    println!();
    for feature in Feature::ALL {
        let unlocked: Vec<&str> = TierLevel::ALL
            .iter()
            .filter(|t| **t >= feature.required_tier())
            .map(|t| t.as_str())
            .collect();
        println!("{:<18} {}", feature.name(), unlocked.join(","));
    }
    println!();
}

fn report(name: &str, ok: bool) {
    if ok {
        info!(backend = name, "Backend reachable");
        println!("pxs-selfcheck: {} ok", name);
    } else {
        error!(backend = name, "Backend unreachable");
        println!("pxs-selfcheck: {} FAILED", name);
    }
}
