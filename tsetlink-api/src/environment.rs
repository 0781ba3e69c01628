use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;
use tsetlink_core::client::EngineClient;
use tsetlink_core::function::{FunctionDescriptor, FunctionKind};
use tsetlink_core::gateway::Gateway;
use tsetlink_core::network::TcpGateway;
use tsetlink_core::types::{RemoteRef, Value};

use crate::config::{EnvironmentOptions, GatewaySettings};
use crate::functions::FunctionRegistry;
use crate::tset::{KeyedTSet, TSet};

/// Engine connection shared by the environment and every proxy it hands out.
pub(crate) type Session = Rc<RefCell<EngineClient>>;

/// Outcome of [`Environment::launch`].
pub enum Launch {
    /// The job was submitted and the connection closed.
    Submitted,
    /// A long-lived worker session.
    Session(Environment),
}

/// Opaque handle to the engine's inter-process communicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intercom {
    pub handle: RemoteRef,
}

/// Session with the remote engine.
///
/// Created with [`init`](Self::init) from the process environment, or with
/// [`launch`](Self::launch) over any [`Gateway`]. Datasets are created through
/// [`create_source`](Self::create_source), [`parallelize_list`](Self::parallelize_list)
/// and friends; the returned proxies share this session.
pub struct Environment {
    session: Session,
    functions: FunctionRegistry,
}

impl Environment {
    /// Connect using `T2_PORT` / `T2_BOOTSTRAP` and branch on the leg.
    ///
    /// On the bootstrap leg this submits the job described by `options` and
    /// exits the process with status 0; it only returns on the session leg
    /// or on error.
    pub fn init(options: EnvironmentOptions) -> Result<Environment> {
        let settings = GatewaySettings::from_env()?;
        let gateway = TcpGateway::connect(settings.addr())?;
        match Self::launch(gateway, settings.bootstrap, options)? {
            Launch::Submitted => std::process::exit(0),
            Launch::Session(env) => Ok(env),
        }
    }

    /// Run the two-way branch over `gateway`.
    ///
    /// Bootstrap forwards every config entry, then the job name if set, then
    /// each resource request, commits, waits `options.submit_grace` and
    /// closes the connection. Otherwise the predefined function registry is
    /// fetched and a session is returned.
    pub fn launch(
        gateway: impl Gateway + 'static,
        bootstrap: bool,
        options: EnvironmentOptions,
    ) -> Result<Launch> {
        let mut client = EngineClient::new(gateway);
        if bootstrap {
            Self::submit(&mut client, &options)?;
            return Ok(Launch::Submitted);
        }

        let handle = client.functions()?;
        tracing::info!(functions = handle.names.len(), "session started");
        let session = Rc::new(RefCell::new(client));
        let functions = FunctionRegistry::new(Rc::clone(&session), handle);
        Ok(Launch::Session(Environment { session, functions }))
    }

    fn submit(client: &mut EngineClient, options: &EnvironmentOptions) -> Result<()> {
        for (key, value) in &options.config {
            client.add_config(key, value.clone())?;
        }
        if let Some(name) = &options.name {
            client.set_job_name(name)?;
        }
        for resource in &options.resources {
            client.create_compute_resource(resource)?;
        }
        client.commit()?;
        tracing::info!(
            job = options.name.as_deref().unwrap_or("<unnamed>"),
            resources = options.resources.len(),
            "job committed"
        );
        std::thread::sleep(options.submit_grace);
        client.close()
    }

    pub fn config(&self) -> Result<BTreeMap<String, Value>> {
        let entries = self.session.borrow_mut().get_config()?;
        Ok(entries.into_iter().collect())
    }

    pub fn worker_id(&self) -> Result<i32> {
        self.session.borrow_mut().get_worker_id()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Create a dataset from a source function.
    ///
    /// `parallelism == 0` lets the engine choose. A descriptor that is not a
    /// source function is rejected before anything is sent.
    pub fn create_source(&self, source: &FunctionDescriptor, parallelism: u32) -> Result<TSet> {
        source.ensure_kind(FunctionKind::Source)?;
        let function = source.to_bytes()?;
        let remote = self
            .session
            .borrow_mut()
            .create_source(function, parallelism)?;
        Ok(TSet::new(Rc::clone(&self.session), remote))
    }

    pub fn create_keyed_source(
        &self,
        source: &FunctionDescriptor,
        parallelism: u32,
    ) -> Result<KeyedTSet> {
        source.ensure_kind(FunctionKind::Source)?;
        let function = source.to_bytes()?;
        let remote = self
            .session
            .borrow_mut()
            .create_keyed_source(function, parallelism)?;
        Ok(KeyedTSet::new(Rc::clone(&self.session), remote))
    }

    pub fn parallelize_list<T, I>(&self, items: I, parallelism: u32) -> Result<TSet>
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        let collection = Value::List(items.into_iter().map(Into::into).collect());
        let remote = self
            .session
            .borrow_mut()
            .parallelize(collection, parallelism)?;
        Ok(TSet::new(Rc::clone(&self.session), remote))
    }

    /// Create a keyed dataset from key/value pairs.
    ///
    /// With a `key_comparator`, the comparator is built through the function
    /// registry and the comparator variant of `parallelize` is used.
    pub fn parallelize_dict<K, V, I>(
        &self,
        entries: I,
        parallelism: u32,
        key_comparator: Option<&FunctionDescriptor>,
    ) -> Result<KeyedTSet>
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let collection = Value::map(entries);
        let remote = match key_comparator {
            Some(comparator) => {
                let comparator = self.functions.comparator(comparator)?;
                self.session.borrow_mut().parallelize_with_comparator(
                    collection,
                    comparator,
                    parallelism,
                )?
            }
            None => self
                .session
                .borrow_mut()
                .parallelize(collection, parallelism)?,
        };
        Ok(KeyedTSet::new(Rc::clone(&self.session), remote))
    }

    pub fn get_mpi_intercom(&self) -> Result<Intercom> {
        let handle = self.session.borrow_mut().get_mpi_intercom()?;
        Ok(Intercom { handle })
    }
}
