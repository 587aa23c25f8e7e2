//! Edit checks for retiring and revising units.

use shared_types::vocab::{dc, np};
use shared_types::{Caller, CallerContext, Iri, QuadPattern, Term};

use super::NanopubManager;
use crate::domain::errors::{NanopubError, NanopubResult};
use crate::domain::identity::IdentityAllocator;
use crate::ports::outbound::{BlobDepot, QuadStore, TimeSource};

impl<QS, BD, IA, TS> NanopubManager<QS, BD, IA, TS>
where
    QS: QuadStore,
    BD: BlobDepot,
    IA: IdentityAllocator,
    TS: TimeSource,
{
    /// Fail with `Unauthorized` unless `ctx` may edit `target`.
    pub(crate) fn authorize(&self, ctx: &CallerContext, target: &Iri) -> NanopubResult<()> {
        let allowed = match &ctx.caller {
            Caller::User { .. } => ctx.can_edit(&self.contributors(target)?),
            _ => ctx.can_edit(&[]),
        };
        if allowed {
            return Ok(());
        }
        tracing::warn!(
            target = %target,
            caller = ?ctx.caller,
            "[kg-01] Edit denied"
        );
        Err(NanopubError::Unauthorized {
            target: target.clone(),
        })
    }

    /// Users recorded as `assertion dc:contributor ?user` in the unit's pubinfo.
    fn contributors(&self, target: &Iri) -> NanopubResult<Vec<Iri>> {
        let head = Term::Iri(target.clone());
        let assertions = self.store.objects_of(&head, &Iri::new(np::HAS_ASSERTION))?;
        let pubinfos = self
            .store
            .objects_of(&head, &Iri::new(np::HAS_PUBLICATION_INFO))?;

        let mut users = Vec::new();
        for assertion in &assertions {
            for info in &pubinfos {
                let pattern = QuadPattern::any()
                    .subject(assertion.clone())
                    .predicate(Iri::new(dc::CONTRIBUTOR))
                    .graph(info.clone());
                for quad in self.store.match_quads(&pattern)? {
                    if let Term::Iri(user) = quad.object {
                        users.push(user);
                    }
                }
            }
        }
        Ok(users)
    }
}
