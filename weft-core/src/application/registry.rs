use crate::foundation::{MspId, OrdererName, PeerName, Result, WeftError};
use crate::infrastructure::rpc::{OrdererHandle, PeerHandle};
use crate::infrastructure::wallet::CertificateAuthority;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Handle bundle for one certificate authority endpoint.
#[derive(Clone)]
pub struct CaHandle {
    pub name: String,
    pub url: String,
    pub rpc: Arc<dyn CertificateAuthority>,
}

/// The nodes one connection knows about. Populated once at construction and
/// read-only afterwards; peers keep their registration order because channel
/// discovery walks them in that order.
#[derive(Default)]
pub struct NodeRegistry {
    peers: Vec<PeerHandle>,
    peer_index: HashMap<PeerName, usize>,
    orderers: HashMap<OrdererName, OrdererHandle>,
    authorities: HashMap<String, CaHandle>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&mut self, handle: PeerHandle) {
        match self.peer_index.get(&handle.name) {
            Some(&index) => self.peers[index] = handle,
            None => {
                self.peer_index.insert(handle.name.clone(), self.peers.len());
                self.peers.push(handle);
            }
        }
    }

    pub fn add_orderer(&mut self, handle: OrdererHandle) {
        self.orderers.insert(handle.name.clone(), handle);
    }

    pub fn add_authority(&mut self, handle: CaHandle) {
        self.authorities.insert(handle.name.clone(), handle);
    }

    pub fn peer(&self, name: &PeerName) -> Result<&PeerHandle> {
        self.peer_index
            .get(name)
            .map(|&index| &self.peers[index])
            .ok_or_else(|| WeftError::PeerNotFound(name.to_string()))
    }

    /// All peers, in registration order.
    pub fn peers(&self) -> &[PeerHandle] {
        &self.peers
    }

    pub fn peer_names(&self) -> Vec<PeerName> {
        self.peers.iter().map(|peer| peer.name.clone()).collect()
    }

    pub fn organizations(&self) -> BTreeSet<MspId> {
        self.peers.iter().map(|peer| peer.msp_id.clone()).collect()
    }

    pub fn orderer(&self, name: &OrdererName) -> Result<&OrdererHandle> {
        self.orderers.get(name).ok_or_else(|| WeftError::OrdererNotFound(name.to_string()))
    }

    pub fn orderer_names(&self) -> Vec<OrdererName> {
        let mut names: Vec<OrdererName> = self.orderers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn authority(&self, name: &str) -> Result<&CaHandle> {
        self.authorities.get(name).ok_or_else(|| WeftError::CaNotFound(name.to_string()))
    }
}
