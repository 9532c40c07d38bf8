use crate::cli::{Environment, UploadArgs};
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_config::Config;
use sipkit_storage::backend::LocalBackend;
use sipkit_storage::{StorageBackend, upload_dir};
use tracing::{info, warn};

pub fn run(args: UploadArgs, config: &Config, asker: &Asker) -> Result<()> {
    let fail = || ErrorKind::Command("upload");
    let dir = asker.dir(args.dir, "folder of tarballs")?;
    let backend: Box<dyn StorageBackend> = match args.local {
        Some(root) => {
            let root = std::path::absolute(&root).or_raise(fail)?;
            Box::new(LocalBackend::new("local", root).or_raise(fail)?)
        },
        None => {
            let environment = match args.environment {
                Some(environment) => environment,
                None => match asker.select("Upload to", &["Demo", "Production"], 0)? {
                    0 => Environment::Demo,
                    _ => Environment::Production,
                },
            };
            let key_id = asker.secret(args.access_key_id, "access key ID")?;
            let key_secret = asker.secret(args.secret_access_key, "secret access key")?;
            s3(config, environment, key_id, key_secret)?
        },
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .or_raise(|| ErrorKind::Runtime)?;
    let report = runtime.block_on(upload_dir(backend.as_ref(), &dir)).or_raise(fail)?;
    for failed in &report.failed {
        warn!(path = %failed.display(), "not uploaded");
    }
    info!(destination = backend.name(), found = report.found, uploaded = report.uploaded, "upload finished");
    Ok(())
}

#[cfg(feature = "s3")]
fn s3(config: &Config, environment: Environment, key_id: String, key_secret: String) -> Result<Box<dyn StorageBackend>> {
    use sipkit_storage::backend::S3Backend;

    let (name, bucket) = match environment {
        Environment::Demo => ("demo", &config.transfer.demo_bucket),
        Environment::Production => ("production", &config.transfer.production_bucket),
    };
    let backend = S3Backend::new(
        name,
        bucket.as_str(),
        None,
        config.transfer.region.as_str(),
        config.transfer.endpoint.clone(),
        key_id,
        key_secret,
    )
    .or_raise(|| ErrorKind::Command("upload"))?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "s3"))]
fn s3(_: &Config, _: Environment, _: String, _: String) -> Result<Box<dyn StorageBackend>> {
    exn::bail!(ErrorKind::Unsupported("S3 (built without the `s3` feature)"))
}
