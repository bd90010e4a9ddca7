//! Asynchronous photo acquisition boundary.
//!
//! A photo request resolves at most once: either the delivery side hands over
//! bytes (or an explicit "nothing"), or it is dropped, which the waiting side
//! sees as `None`. The session only ever sees the settled result.

use async_trait::async_trait;
use log::debug;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::catalog::ItemId;
use crate::error::HuntError;
use crate::item::Item;
use crate::session::{CommitOutcome, HuntSession};

/// Waiting side of a single photo request.
#[derive(Debug)]
pub struct PhotoRequest {
    receiver: oneshot::Receiver<Option<Vec<u8>>>,
}

/// Resolving side of a single photo request.
#[derive(Debug)]
pub struct PhotoDelivery {
    sender: oneshot::Sender<Option<Vec<u8>>>,
}

impl PhotoRequest {
    /// Create a linked request/delivery pair.
    #[must_use]
    pub fn channel() -> (PhotoDelivery, Self) {
        let (sender, receiver) = oneshot::channel();
        (PhotoDelivery { sender }, Self { receiver })
    }
}

impl Future for PhotoRequest {
    type Output = Option<Vec<u8>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(None))
    }
}

impl PhotoDelivery {
    /// Settle the request. Consumes the delivery, so it can only happen once.
    pub fn resolve(self, photo: Option<Vec<u8>>) {
        if self.sender.send(photo).is_err() {
            debug!("photo request was abandoned before delivery");
        }
    }

    /// Settle the request with "nothing picked".
    pub fn cancel(self) {
        self.resolve(None);
    }
}

/// Platform capability that lets the user pick one image for an item.
#[async_trait]
pub trait PhotoSource {
    async fn request_photo(&self, item: &Item) -> Option<Vec<u8>>;
}

impl HuntSession {
    /// Ask `source` for a photo of `item_id` and commit whatever comes back.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::UnknownItem`] if `item_id` is not in this hunt; the
    /// source is not consulted in that case.
    pub async fn capture<S>(
        &mut self,
        item_id: &ItemId,
        source: &S,
    ) -> Result<CommitOutcome, HuntError>
    where
        S: PhotoSource + Sync + ?Sized,
    {
        let index = self.index_of(item_id)?;
        let picked = source.request_photo(&self.items()[index]).await;
        self.apply_photo(item_id, picked)
    }

    /// Commit the settled result of an already issued request.
    ///
    /// # Errors
    ///
    /// Returns [`HuntError::UnknownItem`] if `item_id` is not in this hunt.
    pub async fn await_photo(
        &mut self,
        item_id: &ItemId,
        request: PhotoRequest,
    ) -> Result<CommitOutcome, HuntError> {
        self.index_of(item_id)?;
        let picked = request.await;
        self.apply_photo(item_id, picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::fixtures::jpeg;
    use crate::session::CommitStatus;

    struct FixedSource(Option<Vec<u8>>);

    #[async_trait]
    impl PhotoSource for FixedSource {
        async fn request_photo(&self, _item: &Item) -> Option<Vec<u8>> {
            self.0.clone()
        }
    }

    #[test]
    fn request_resolves_with_delivered_bytes() {
        let (delivery, request) = PhotoRequest::channel();
        delivery.resolve(Some(vec![1, 2, 3]));
        assert_eq!(tokio_test::block_on(request), Some(vec![1, 2, 3]));
    }

    #[test]
    fn dropped_delivery_resolves_to_none() {
        let (delivery, request) = PhotoRequest::channel();
        drop(delivery);
        assert_eq!(tokio_test::block_on(request), None);

        let (delivery, request) = PhotoRequest::channel();
        delivery.cancel();
        assert_eq!(tokio_test::block_on(request), None);
    }

    #[test]
    fn capture_commits_picked_photo() {
        let mut session = HuntSession::from_builtin().unwrap();
        let id = session.items()[0].id().clone();
        let source = FixedSource(Some(jpeg(4)));
        let outcome = tokio_test::block_on(session.capture(&id, &source)).unwrap();
        assert_eq!(outcome.status, CommitStatus::Found);
        assert_eq!(session.found_count(), 1);
    }

    #[test]
    fn capture_treats_nothing_as_cancel() {
        let mut session = HuntSession::from_builtin().unwrap();
        let id = session.items()[0].id().clone();
        let outcome = tokio_test::block_on(session.capture(&id, &FixedSource(None))).unwrap();
        assert_eq!(outcome.status, CommitStatus::Cancelled);
        assert_eq!(session.found_count(), 0);
    }

    #[test]
    fn await_photo_rejects_unknown_items() {
        let mut session = HuntSession::from_builtin().unwrap();
        let (delivery, request) = PhotoRequest::channel();
        delivery.resolve(Some(jpeg(1)));
        let err = tokio_test::block_on(session.await_photo(&ItemId::from("unicorn"), request))
            .unwrap_err();
        assert!(matches!(err, HuntError::UnknownItem(_)));
    }

    #[test]
    fn await_photo_commits_late_delivery() {
        let mut session = HuntSession::from_builtin().unwrap();
        let id = session.items()[5].id().clone();
        let (delivery, request) = PhotoRequest::channel();
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let outcome = rt.block_on(async {
            tokio::spawn(async move { delivery.resolve(Some(jpeg(8))) });
            session.await_photo(&id, request).await
        });
        assert_eq!(outcome.unwrap().status, CommitStatus::Found);
    }
}
