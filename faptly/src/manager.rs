// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The repository engine.

[Manager] owns an [ObjectStore] and a [Signer] and maintains suites in the
store: the `pool/<suite>/...` package blobs, the per-architecture
`dists/<suite>/<component>/binary-<cpu>/Packages` indexes, and the
clear-signed `dists/<suite>/InRelease` descriptor that attests the tree.

A suite exists iff its `InRelease` blob does. Uploads are the only
mutation; they run the package pipeline (extract control, hash, pool
placement) in a bounded worker pool and finish by rewriting the indexes
and rebuilding the release.
*/

use {
    crate::{
        binary_package::{BinaryPackage, PackagesIndex},
        config::Config,
        deb,
        digest::{digest_data, ChecksumType},
        error::{FaptlyError, Result},
        pgp::Signer,
        release::{Arch, FileHashEntry, Release},
        store::{s3::S3Store, ObjectStore},
    },
    chrono::Utc,
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    },
    tokio::{sync::Semaphore, task::JoinSet},
    tracing::{debug, info},
};

pub const POOL_DIR: &str = "pool";
pub const DISTS_DIR: &str = "dists";
pub const RELEASE_FILE: &str = "InRelease";
pub const PACKAGES_FILE: &str = "Packages";

/// Repository manager bound to an object store and a signing identity.
pub struct Manager {
    store: Arc<dyn ObjectStore>,
    signer: Signer,
}

impl Manager {
    /// Construct a manager from configuration, backed by S3.
    pub fn new(config: &Config) -> Result<Self> {
        let store = S3Store::new(
            &config.s3_endpoint,
            &config.s3_bucket,
            &config.s3_access_key,
            &config.s3_secret_key,
        )?;
        let signer = Signer::from_armored(
            config.private_gpg_key.as_bytes(),
            &config.private_gpg_passkey,
        )?;

        Ok(Self {
            store: Arc::new(store),
            signer,
        })
    }

    /// Construct a manager over an arbitrary store.
    pub fn with_store(store: Arc<dyn ObjectStore>, signer: Signer) -> Self {
        Self { store, signer }
    }

    fn release_path(suite: &str) -> String {
        format!("{}/{}/{}", DISTS_DIR, suite, RELEASE_FILE)
    }

    fn packages_path(suite: &str, component: &str, cpu: &str) -> String {
        format!(
            "{}/{}/{}/binary-{}/{}",
            DISTS_DIR, suite, component, cpu, PACKAGES_FILE
        )
    }

    fn pool_path(suite: &str, component: &str, name: &str, basename: &str) -> String {
        let prefix: String = name.chars().take(1).collect();

        format!(
            "{}/{}/{}/{}/{}/{}",
            POOL_DIR, suite, component, prefix, name, basename
        )
    }

    /// Whether a repository exists for the suite.
    pub async fn repo_exists(&self, suite: &str) -> Result<bool> {
        self.store.exists(&Self::release_path(suite)).await
    }

    async fn release(&self, suite: &str) -> Result<Release> {
        if !self.repo_exists(suite).await? {
            return Err(FaptlyError::RepoNotFound(suite.to_string()));
        }

        let data = self.store.get(&Self::release_path(suite)).await?;

        Release::from_armored(&data)
    }

    /// Create a repository for the suite.
    ///
    /// Writes an empty `Packages` index for every (component, architecture)
    /// pair, then publishes the signed release.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_repo(
        &self,
        origin: &str,
        suite: &str,
        label: &str,
        codename: &str,
        description: &str,
        components: &[String],
        architectures: &[String],
    ) -> Result<()> {
        if self.repo_exists(suite).await? {
            return Err(FaptlyError::RepoExists(suite.to_string()));
        }

        for component in components {
            for cpu in architectures {
                self.store
                    .put(&Self::packages_path(suite, component, cpu), &[])
                    .await?;
            }
        }

        let mut release = Release {
            origin: origin.to_string(),
            suite: suite.to_string(),
            label: label.to_string(),
            codename: codename.to_string(),
            description: description.to_string(),
            components: components.to_vec(),
            architectures: architectures.iter().map(Arch::new).collect(),
            ..Release::default()
        };

        self.rebuild_release(&mut release).await
    }

    /// Delete a repository: the suite's pool and dists prefixes.
    ///
    /// Removal failures are surfaced; a partially deleted repository can be
    /// deleted again.
    pub async fn delete_repo(&self, suite: &str) -> Result<()> {
        if !self.repo_exists(suite).await? {
            return Err(FaptlyError::RepoNotFound(suite.to_string()));
        }

        for dir in [POOL_DIR, DISTS_DIR] {
            self.store
                .delete_prefix(&format!("{}/{}/", dir, suite))
                .await?;
        }

        info!("deleted repository {}", suite);

        Ok(())
    }

    /// Enumerate repositories by walking `dists/` for `InRelease` markers.
    pub async fn list_repos(&self) -> Result<Vec<Release>> {
        let prefix = format!("{}/", DISTS_DIR);
        let mut paths = vec![];

        self.store
            .walk(&prefix, &mut |path| {
                if let Some(rest) = path.strip_prefix(&prefix) {
                    if let Some(suite) = rest.strip_suffix(&format!("/{}", RELEASE_FILE)) {
                        if !suite.is_empty() && !suite.contains('/') {
                            paths.push(path.to_string());
                        }
                    }
                }

                Ok(())
            })
            .await?;

        let mut releases = vec![];
        for path in paths {
            let data = self.store.get(&path).await?;
            releases.push(Release::from_armored(&data)?);
        }

        Ok(releases)
    }

    /// Fetch the release descriptor for a suite.
    pub async fn show_repo(&self, suite: &str) -> Result<Release> {
        self.release(suite).await
    }

    async fn binary_index(&self, suite: &str, component: &str, cpu: &str) -> Result<PackagesIndex> {
        let data = self
            .store
            .get(&Self::packages_path(suite, component, cpu))
            .await?;

        PackagesIndex::parse(&data)
    }

    fn check_component_and_arch(
        release: &Release,
        component: &str,
        architecture: &str,
    ) -> Result<()> {
        if !release.has_component(component) {
            return Err(FaptlyError::UnsupportedComponent(component.to_string()));
        }

        if !release.has_architecture(architecture) {
            return Err(FaptlyError::UnsupportedArchitecture(
                architecture.to_string(),
            ));
        }

        Ok(())
    }

    /// List the index entries for one (suite, component, architecture).
    pub async fn list_pkgs(
        &self,
        suite: &str,
        component: &str,
        architecture: &str,
    ) -> Result<Vec<BinaryPackage>> {
        let release = self.release(suite).await?;
        Self::check_component_and_arch(&release, component, architecture)?;

        Ok(self
            .binary_index(suite, component, architecture)
            .await?
            .into_packages())
    }

    /// Fetch the index entry whose pool basename matches, if any.
    pub async fn show_pkg(
        &self,
        suite: &str,
        component: &str,
        architecture: &str,
        package: &str,
    ) -> Result<Option<BinaryPackage>> {
        let release = self.release(suite).await?;
        Self::check_component_and_arch(&release, component, architecture)?;

        Ok(self
            .binary_index(suite, component, architecture)
            .await?
            .find_basename(package)
            .cloned())
    }

    /// Upload `.deb` files into a component of a suite.
    ///
    /// Packages are processed by a worker pool bounded to the CPU count.
    /// Each worker extracts and parses the control stanza, digests the
    /// file, updates the in-memory per-cpu indexes under a mutex, and
    /// writes the pool blob. `Architecture: all` packages land in every
    /// per-cpu index. The first failure cancels workers that have not
    /// started; successful pool writes stay in place.
    pub async fn upload_pkgs(&self, suite: &str, component: &str, pkgs: &[PathBuf]) -> Result<()> {
        let mut release = self.release(suite).await?;

        if !release.has_component(component) {
            return Err(FaptlyError::UnsupportedComponent(component.to_string()));
        }

        let mut indexes = HashMap::new();
        for arch in &release.architectures {
            indexes.insert(
                arch.cpu.clone(),
                self.binary_index(suite, component, &arch.cpu).await?,
            );
        }

        let indexes = Arc::new(Mutex::new(indexes));
        let architectures = Arc::new(release.architectures.clone());
        let semaphore = Arc::new(Semaphore::new(num_cpus::get()));
        let mut workers: JoinSet<Result<()>> = JoinSet::new();

        for pkg in pkgs {
            let pkg = pkg.clone();
            let suite = suite.to_string();
            let component = component.to_string();
            let store = Arc::clone(&self.store);
            let indexes = Arc::clone(&indexes);
            let architectures = Arc::clone(&architectures);
            let semaphore = Arc::clone(&semaphore);

            workers.spawn(async move {
                // A closed semaphore means the batch was cancelled; don't
                // start new work.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return Ok(()),
                };

                upload_one(&pkg, &suite, &component, &architectures, &indexes, &*store).await
            });
        }

        let mut result = Ok(());

        while let Some(joined) = workers.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => continue,
            };

            if let Err(e) = outcome {
                if result.is_ok() {
                    // First failure: stop handing out permits, let in-flight
                    // workers finish their current write.
                    semaphore.close();
                    result = Err(e);
                }
            }
        }

        result?;

        let indexes = std::mem::take(
            &mut *indexes.lock().expect("index lock poisoned"),
        );

        for (cpu, index) in &indexes {
            self.store
                .put(
                    &Self::packages_path(suite, component, cpu),
                    &index.to_bytes()?,
                )
                .await?;
        }

        self.rebuild_release(&mut release).await
    }

    /// Recompute the release manifests from the store and republish the
    /// signed `InRelease`.
    async fn rebuild_release(&self, release: &mut Release) -> Result<()> {
        let prefix = format!("{}/{}/", DISTS_DIR, release.suite);
        let mut index_paths = vec![];

        self.store
            .walk(&prefix, &mut |path| {
                if path.ends_with(PACKAGES_FILE) {
                    index_paths.push(path.to_string());
                }

                Ok(())
            })
            .await?;

        release.clear_manifests();

        for path in index_paths {
            let data = self.store.get(&path).await?;
            let digests = digest_data(&data);
            let relative = path.strip_prefix(&prefix).unwrap_or(&path).to_string();

            debug!("release manifest entry for {}", relative);

            for checksum in ChecksumType::all() {
                release.push_manifest_entry(
                    checksum,
                    FileHashEntry {
                        digest: digests.hex(checksum).to_string(),
                        size: data.len() as u64,
                        path: relative.clone(),
                    },
                );
            }
        }

        release.date = Some(Utc::now());

        let mut buf = vec![];
        release.to_paragraph().write(&mut buf)?;

        let signed = self.signer.clearsign(&buf)?;

        self.store
            .put(&Self::release_path(&release.suite), signed.as_bytes())
            .await?;

        info!("published release for {}", release.suite);

        Ok(())
    }
}

/// One upload worker: package file to indexed pool blob.
async fn upload_one(
    pkg: &Path,
    suite: &str,
    component: &str,
    architectures: &[Arch],
    indexes: &Mutex<HashMap<String, PackagesIndex>>,
    store: &dyn ObjectStore,
) -> Result<()> {
    let data = tokio::fs::read(pkg).await?;

    let control = deb::extract_control(&data)?;
    let mut package = BinaryPackage::from_control_data(&control)?;

    let cpu = package.architecture()?.to_string();
    if cpu != "all" && !architectures.iter().any(|a| a.cpu == cpu) {
        return Err(FaptlyError::UnsupportedArchitecture(cpu));
    }

    let basename = pkg
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| FaptlyError::NotDebArchive(pkg.display().to_string()))?;

    // Pool placement groups by source package when the stanza names one.
    let name = match package.source() {
        Some(source) => source.to_string(),
        None => package.package()?.to_string(),
    };

    let digests = digest_data(&data);
    let filename = Manager::pool_path(suite, component, &name, &basename);

    package.set_field_from_string("Size", data.len().to_string());
    for checksum in ChecksumType::all() {
        package.set_field_from_string(
            checksum.index_field_name(),
            digests.hex(checksum).to_string(),
        );
    }
    package.set_field_from_string("Filename", filename.clone());

    {
        let mut indexes = indexes.lock().expect("index lock poisoned");

        if cpu == "all" {
            for arch in architectures {
                if let Some(index) = indexes.get_mut(&arch.cpu) {
                    index.replace(package.clone());
                }
            }
        } else if let Some(index) = indexes.get_mut(&cpu) {
            index.replace(package.clone());
        }
    }

    store.put(&filename, &data).await?;

    info!("uploaded package {}", pkg.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            pgp::CleartextDocument,
            store::memory::MemoryStore,
            testutil::{build_deb, test_signer},
        },
        std::io::Write,
    };

    fn test_manager() -> (Manager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let (signer, _) = test_signer();

        (
            Manager::with_store(store.clone(), signer.clone()),
            store,
        )
    }

    async fn create_stable(manager: &Manager, architectures: &[&str]) -> Result<()> {
        manager
            .create_repo(
                "Acme",
                "stable",
                "Acme",
                "bookworm",
                "Acme internal packages",
                &["main".to_string()],
                &architectures
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>(),
            )
            .await
    }

    fn write_deb(dir: &tempfile::TempDir, basename: &str, deb: &[u8]) -> PathBuf {
        let path = dir.path().join(basename);
        let mut file = std::fs::File::create(&path).expect("fixture file should create");
        file.write_all(deb).expect("fixture file should write");

        path
    }

    #[tokio::test]
    async fn create_writes_layout_and_signed_release() -> Result<()> {
        let (manager, store) = test_manager();
        let (_, public_key) = test_signer();

        create_stable(&manager, &["amd64"]).await?;

        assert_eq!(
            store.get("dists/stable/main/binary-amd64/Packages").await?,
            b""
        );

        let inrelease = store.get("dists/stable/InRelease").await?;
        assert!(inrelease.starts_with(b"-----BEGIN PGP SIGNED MESSAGE-----"));

        let document = CleartextDocument::parse(std::io::Cursor::new(&inrelease))?;
        assert_eq!(document.verify(public_key)?, 1);

        let release = manager.show_repo("stable").await?;
        assert_eq!(release.origin, "Acme");
        assert_eq!(release.suite, "stable");
        assert_eq!(release.label, "Acme");
        assert_eq!(release.codename, "bookworm");
        assert_eq!(release.description, "Acme internal packages");
        assert_eq!(release.components, vec!["main"]);
        assert_eq!(release.architectures, vec![Arch::new("amd64")]);
        assert!(release.date.is_some());

        // The empty Packages index is already attested.
        assert_eq!(release.md5.len(), 1);
        assert_eq!(release.md5[0].path, "main/binary-amd64/Packages");
        assert_eq!(release.md5[0].size, 0);

        Ok(())
    }

    #[tokio::test]
    async fn create_twice_fails() -> Result<()> {
        let (manager, _) = test_manager();

        create_stable(&manager, &["amd64"]).await?;

        assert!(matches!(
            create_stable(&manager, &["amd64"]).await,
            Err(FaptlyError::RepoExists(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn operations_on_missing_repo_fail() {
        let (manager, _) = test_manager();

        assert!(matches!(
            manager.show_repo("stable").await,
            Err(FaptlyError::RepoNotFound(_))
        ));
        assert!(matches!(
            manager.delete_repo("stable").await,
            Err(FaptlyError::RepoNotFound(_))
        ));
        assert!(matches!(
            manager.upload_pkgs("stable", "main", &[]).await,
            Err(FaptlyError::RepoNotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_places_pool_blob_and_indexes_it() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        let deb = build_deb("hello", "1.0", "amd64", Some("hello"));
        let dir = tempfile::tempdir()?;
        let path = write_deb(&dir, "hello_1.0_amd64.deb", &deb);

        manager.upload_pkgs("stable", "main", &[path]).await?;

        let pool = store
            .get("pool/stable/main/h/hello/hello_1.0_amd64.deb")
            .await?;
        assert_eq!(pool, deb);

        let packages = manager.list_pkgs("stable", "main", "amd64").await?;
        assert_eq!(packages.len(), 1);

        let entry = &packages[0];
        let digests = digest_data(&deb);
        assert_eq!(entry.package()?, "hello");
        assert_eq!(
            entry.filename(),
            Some("pool/stable/main/h/hello/hello_1.0_amd64.deb")
        );
        assert_eq!(entry.size().unwrap()?, deb.len() as u64);
        assert_eq!(entry.field_str("MD5sum"), Some(digests.md5.as_str()));
        assert_eq!(entry.field_str("SHA1"), Some(digests.sha1.as_str()));
        assert_eq!(entry.field_str("SHA256"), Some(digests.sha256.as_str()));

        let shown = manager
            .show_pkg("stable", "main", "amd64", "hello_1.0_amd64.deb")
            .await?;
        assert!(shown.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn upload_without_source_groups_by_package_name() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        let deb = build_deb("tool", "2.1", "amd64", None);
        let dir = tempfile::tempdir()?;
        let path = write_deb(&dir, "tool_2.1_amd64.deb", &deb);

        manager.upload_pkgs("stable", "main", &[path]).await?;

        assert!(store.exists("pool/stable/main/t/tool/tool_2.1_amd64.deb").await?);

        Ok(())
    }

    #[tokio::test]
    async fn upload_is_idempotent() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        let deb = build_deb("hello", "1.0", "amd64", Some("hello"));
        let dir = tempfile::tempdir()?;
        let path = write_deb(&dir, "hello_1.0_amd64.deb", &deb);

        manager
            .upload_pkgs("stable", "main", &[path.clone()])
            .await?;
        let packages_first = store.get("dists/stable/main/binary-amd64/Packages").await?;
        let release_first = manager.show_repo("stable").await?;

        manager.upload_pkgs("stable", "main", &[path]).await?;
        let packages_second = store.get("dists/stable/main/binary-amd64/Packages").await?;
        let release_second = manager.show_repo("stable").await?;

        // Index bytes identical; release identical up to Date/signature.
        assert_eq!(packages_first, packages_second);
        assert_eq!(release_first.md5, release_second.md5);
        assert_eq!(release_first.sha1, release_second.sha1);
        assert_eq!(release_first.sha256, release_second.sha256);

        let pool = store
            .get("pool/stable/main/h/hello/hello_1.0_amd64.deb")
            .await?;
        assert_eq!(pool, deb);

        Ok(())
    }

    #[tokio::test]
    async fn arch_all_fans_out_to_every_cpu() -> Result<()> {
        let (manager, _) = test_manager();
        create_stable(&manager, &["amd64", "arm64"]).await?;

        let deb = build_deb("data", "1", "all", None);
        let dir = tempfile::tempdir()?;
        let path = write_deb(&dir, "data_1_all.deb", &deb);

        manager.upload_pkgs("stable", "main", &[path]).await?;

        let amd64 = manager.list_pkgs("stable", "main", "amd64").await?;
        let arm64 = manager.list_pkgs("stable", "main", "arm64").await?;

        assert_eq!(amd64.len(), 1);
        assert_eq!(arm64.len(), 1);
        assert_eq!(amd64[0], arm64[0]);
        assert_eq!(amd64[0].basename(), Some("data_1_all.deb"));

        Ok(())
    }

    #[tokio::test]
    async fn unsupported_architecture_writes_nothing() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        let deb = build_deb("exotic", "1.0", "mips64", None);
        let dir = tempfile::tempdir()?;
        let path = write_deb(&dir, "exotic_1.0_mips64.deb", &deb);

        assert!(matches!(
            manager.upload_pkgs("stable", "main", &[path]).await,
            Err(FaptlyError::UnsupportedArchitecture(_))
        ));

        assert!(store.keys_with_prefix("pool/").is_empty());
        assert_eq!(
            store.get("dists/stable/main/binary-amd64/Packages").await?,
            b""
        );

        Ok(())
    }

    #[tokio::test]
    async fn upload_to_undeclared_component_fails() -> Result<()> {
        let (manager, _) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        assert!(matches!(
            manager.upload_pkgs("stable", "contrib", &[]).await,
            Err(FaptlyError::UnsupportedComponent(_))
        ));
        assert!(matches!(
            manager.list_pkgs("stable", "contrib", "amd64").await,
            Err(FaptlyError::UnsupportedComponent(_))
        ));
        assert!(matches!(
            manager.list_pkgs("stable", "main", "mips64").await,
            Err(FaptlyError::UnsupportedArchitecture(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn release_manifests_match_stored_bytes() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64", "arm64"]).await?;

        let dir = tempfile::tempdir()?;
        let paths = vec![
            write_deb(&dir, "hello_1.0_amd64.deb", &build_deb("hello", "1.0", "amd64", None)),
            write_deb(&dir, "data_1_all.deb", &build_deb("data", "1", "all", None)),
        ];

        manager.upload_pkgs("stable", "main", &paths).await?;

        let release = manager.show_repo("stable").await?;

        // One row per Packages file, in every manifest.
        assert_eq!(release.md5.len(), 2);
        assert_eq!(release.sha1.len(), 2);
        assert_eq!(release.sha256.len(), 2);

        for checksum in ChecksumType::all() {
            for row in release.manifest(checksum) {
                let data = store.get(&format!("dists/stable/{}", row.path)).await?;

                assert_eq!(row.size, data.len() as u64);
                assert_eq!(row.digest, digest_data(&data).hex(checksum));
            }
        }

        // Pool consistency: every index entry hashes to its pool blob.
        for cpu in ["amd64", "arm64"] {
            for entry in manager.list_pkgs("stable", "main", cpu).await? {
                let blob = store.get(entry.filename().unwrap()).await?;
                let digests = digest_data(&blob);

                assert_eq!(entry.size().unwrap()?, blob.len() as u64);
                assert_eq!(entry.field_str("MD5sum"), Some(digests.md5.as_str()));
                assert_eq!(entry.field_str("SHA256"), Some(digests.sha256.as_str()));
            }
        }

        Ok(())
    }

    #[tokio::test]
    async fn reupload_replaces_entry_for_same_basename() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        let dir = tempfile::tempdir()?;

        let first = build_deb("hello", "1.0", "amd64", None);
        let path = write_deb(&dir, "hello_1.0_amd64.deb", &first);
        manager.upload_pkgs("stable", "main", &[path]).await?;

        // Same basename, rebuilt contents.
        let second = build_deb("hello", "1.0", "amd64", Some("hello-src"));
        let path = write_deb(&dir, "hello_1.0_amd64.deb", &second);
        manager.upload_pkgs("stable", "main", &[path]).await?;

        let packages = manager.list_pkgs("stable", "main", "amd64").await?;
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].source(), Some("hello-src"));
        assert_eq!(
            packages[0].filename(),
            Some("pool/stable/main/h/hello-src/hello_1.0_amd64.deb")
        );

        // The new pool blob exists; the blob from the first upload is now
        // unreferenced but left in place.
        assert_eq!(
            store
                .get("pool/stable/main/h/hello-src/hello_1.0_amd64.deb")
                .await?,
            second
        );
        assert!(store.exists("pool/stable/main/h/hello/hello_1.0_amd64.deb").await?);

        Ok(())
    }

    #[tokio::test]
    async fn list_repos_projects_existing_suites() -> Result<()> {
        let (manager, _) = test_manager();

        assert!(manager.list_repos().await?.is_empty());

        create_stable(&manager, &["amd64"]).await?;
        manager
            .create_repo(
                "Acme",
                "testing",
                "Acme",
                "trixie",
                "testing packages",
                &["main".to_string()],
                &["arm64".to_string()],
            )
            .await?;

        let mut suites = manager
            .list_repos()
            .await?
            .into_iter()
            .map(|r| r.suite)
            .collect::<Vec<_>>();
        suites.sort();

        assert_eq!(suites, vec!["stable", "testing"]);

        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_every_key() -> Result<()> {
        let (manager, store) = test_manager();
        create_stable(&manager, &["amd64"]).await?;

        let dir = tempfile::tempdir()?;
        let path = write_deb(
            &dir,
            "hello_1.0_amd64.deb",
            &build_deb("hello", "1.0", "amd64", None),
        );
        manager.upload_pkgs("stable", "main", &[path]).await?;

        manager.delete_repo("stable").await?;

        assert!(store.keys_with_prefix("pool/stable/").is_empty());
        assert!(store.keys_with_prefix("dists/stable/").is_empty());
        assert!(manager.list_repos().await?.is_empty());

        Ok(())
    }
}
