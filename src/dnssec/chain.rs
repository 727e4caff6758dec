use tracing::{debug, warn};

use super::constants::DEFAULT_MAX_CHAIN_DEPTH;
use super::crypto::{DigestPrimitive, SignaturePrimitive};
use super::errors::Result;
use super::record::Name;
use super::trust_anchor::TrustAnchorStore;
use super::validator::DnsSecValidator;
use super::zone::{Authentication, Delegation, ZoneTrustNode};
use super::{DnsSecError, ValidationResult};

/// Handle to a zone inside a [`TrustChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(usize);

impl ZoneId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Zones linked from a trust anchor down to a target.
///
/// Nodes are stored in insertion order and refer to their parent by
/// [`ZoneId`], so a parent always precedes its children.
#[derive(Debug, Clone)]
pub struct TrustChain {
    zones: Vec<ZoneTrustNode>,
    /// Number of zones from the top of the chain, the top being 1
    depths: Vec<usize>,
    max_depth: usize,
}

impl Default for TrustChain {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustChain {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_CHAIN_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            zones: Vec::new(),
            depths: Vec::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Add a zone below `parent`, or as a top-level zone when `parent` is
    /// `None`. The zone must be strictly below its parent.
    pub fn add_zone(&mut self, mut node: ZoneTrustNode, parent: Option<ZoneId>) -> Result<ZoneId> {
        let depth = match parent {
            None => 1,
            Some(parent_id) => {
                let parent_node = self
                    .get(parent_id)
                    .ok_or(DnsSecError::UnknownZone(parent_id.0))?;
                if !node.zone().is_strictly_below(parent_node.zone()) {
                    return Err(DnsSecError::NotASubzone {
                        child: node.zone().clone(),
                        parent: parent_node.zone().clone(),
                    });
                }
                node.set_parent(parent_id);
                self.depths[parent_id.0] + 1
            }
        };

        if depth > self.max_depth {
            return Err(DnsSecError::ChainTooDeep(self.max_depth));
        }

        let id = ZoneId(self.zones.len());
        debug!("Added {} to trust chain at depth {}", node.zone(), depth);
        self.zones.push(node);
        self.depths.push(depth);
        Ok(id)
    }

    pub fn get(&self, id: ZoneId) -> Option<&ZoneTrustNode> {
        self.zones.get(id.0)
    }

    /// First zone added with this name
    pub fn find(&self, zone: &Name) -> Option<ZoneId> {
        self.zones
            .iter()
            .position(|node| node.zone() == zone)
            .map(ZoneId)
    }

    pub fn parent_of(&self, id: ZoneId) -> Option<&ZoneTrustNode> {
        self.get(id)?.parent().and_then(|parent| self.get(parent))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &ZoneTrustNode)> {
        self.zones
            .iter()
            .enumerate()
            .map(|(index, node)| (ZoneId(index), node))
    }

    /// Verdicts for every zone, indexed like [`TrustChain::iter`].
    ///
    /// Each zone is authenticated once; children reuse their parent's
    /// verdict.
    pub fn evaluate<C>(
        &self,
        validator: &DnsSecValidator<C>,
        anchors: &TrustAnchorStore,
    ) -> Vec<ValidationResult>
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        let mut verdicts: Vec<ValidationResult> = Vec::with_capacity(self.zones.len());
        for node in &self.zones {
            let parent = node
                .parent()
                .and_then(|id| Some((self.zones.get(id.0)?, verdicts.get(id.0)?)));
            let verdict = judge(node, parent, validator, anchors);
            verdicts.push(verdict);
        }
        verdicts
    }

    /// Verdict for a single zone, walking only its ancestors
    pub fn verdict<C>(
        &self,
        id: ZoneId,
        validator: &DnsSecValidator<C>,
        anchors: &TrustAnchorStore,
    ) -> Result<ValidationResult>
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        let mut path = Vec::new();
        let mut next = Some(id);
        while let Some(current) = next {
            let node = self
                .get(current)
                .ok_or(DnsSecError::UnknownZone(current.0))?;
            path.push(node);
            next = node.parent();
        }

        let mut parent: Option<(&ZoneTrustNode, ValidationResult)> = None;
        for node in path.into_iter().rev() {
            let verdict = judge(
                node,
                parent.as_ref().map(|(parent_node, verdict)| (*parent_node, verdict)),
                validator,
                anchors,
            );
            parent = Some((node, verdict));
        }

        parent
            .map(|(_, verdict)| verdict)
            .ok_or(DnsSecError::UnknownZone(id.0))
    }
}

fn judge<C>(
    node: &ZoneTrustNode,
    parent: Option<(&ZoneTrustNode, &ValidationResult)>,
    validator: &DnsSecValidator<C>,
    anchors: &TrustAnchorStore,
) -> ValidationResult
where
    C: SignaturePrimitive + DigestPrimitive,
{
    // An anchored zone starts a new chain regardless of what is above it
    if !matches!(node.delegation(), Delegation::TrustAnchor) {
        if let Some((parent_node, parent_verdict)) = parent {
            let untrusted = || DnsSecError::UntrustedParent(parent_node.zone().clone());
            match parent_verdict {
                ValidationResult::Secure => {}
                ValidationResult::Insecure => return ValidationResult::Insecure,
                ValidationResult::Bogus(_) => return ValidationResult::Bogus(untrusted()),
                ValidationResult::Indeterminate(_) => {
                    return ValidationResult::Indeterminate(untrusted());
                }
            }
        }
    }

    match node.authenticate(validator, parent.map(|(parent_node, _)| parent_node), anchors) {
        Ok(Authentication::Unsigned) => ValidationResult::Insecure,
        Ok(_) => ValidationResult::Secure,
        Err(err) => {
            let verdict = ValidationResult::from_error(err);
            match &verdict {
                ValidationResult::Bogus(err) => {
                    warn!("DNSSEC validation failed for {}: {}", node.zone(), err)
                }
                _ => debug!("DNSSEC validation incomplete for {}: {}", node.zone(), verdict),
            }
            verdict
        }
    }
}
