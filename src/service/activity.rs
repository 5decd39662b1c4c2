//! Activity service
//!
//! Activities can be created, read and deleted but not updated. Comments and
//! likes are actions on an existing activity and need its id.

use serde::Deserialize;

use super::identity::IdentityService;
use super::list_access::{PagedListAccess, StreamKind};
use super::{decode_many, decode_one, encode, CrudService, Operation, QueryParams};
use crate::error::{CodecError, Error, Result, ServiceError};
use crate::model::{
    Activity, ActivityField, ActivityStream, Comment, Identity, Like, Record,
};
use crate::net::client::{segment, SocialClient};
use crate::net::http::{AuthPolicy, HttpGateway};

const SERVICE: &str = Activity::NAME;

#[derive(Deserialize)]
struct LikeResponse {
    like: Option<bool>,
}

/// Activity, comment and like operations
#[derive(Clone)]
pub struct ActivityService {
    client: SocialClient,
    http: HttpGateway,
}

impl ActivityService {
    pub fn new(client: SocialClient) -> Self {
        Self {
            http: client.gateway(SERVICE),
            client,
        }
    }

    /// Get an activity with extra query parameters, e.g. embedded stream metadata
    pub async fn get_with(&self, id: &str, params: &QueryParams) -> Result<Activity> {
        let path = format!("activity/{}.json", segment(SERVICE, id)?);
        let body = self.fetch(&path, params).await?;
        decode_one(SERVICE, &body)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comment on an existing activity
    pub async fn create_comment(&self, activity: &Activity, comment: &Comment) -> Result<Comment> {
        let activity_id = activity.require_id()?;
        let path = format!("activity/{}/comment.json", segment(SERVICE, &activity_id)?);
        let body = self.submit(&path, Some(encode(SERVICE, comment)?)).await?;
        decode_one(SERVICE, &body)
    }

    /// Delete a comment; its activity is found through `activityId` or the embedded activity
    pub async fn delete_comment(&self, comment: &Comment) -> Result<Comment> {
        let comment_id = comment.require_id()?;
        let activity_id = comment
            .clone()
            .activity_id()?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field(Comment::NAME, "activityId"))?;

        let path = format!(
            "activity/{}/comment/destroy/{}.json",
            segment(SERVICE, &activity_id)?,
            segment(SERVICE, &comment_id)?
        );
        let body = self.submit(&path, None).await?;
        decode_one(SERVICE, &body)
    }

    /// Comments cannot be addressed on their own
    pub async fn get_comment(&self, _comment_id: &str) -> Result<Comment> {
        Err(Error::unsupported(SERVICE, Operation::GetComment))
    }

    /// Comments of an activity, in server order
    pub async fn comments(&self, activity: &Activity) -> Result<Vec<Comment>> {
        let activity_id = activity.require_id()?;
        let path = format!("activity/{}/comments.json", segment(SERVICE, &activity_id)?);
        let body = self.fetch(&path, &QueryParams::new()).await?;
        decode_many(SERVICE, &body)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Identities that like an activity
    pub async fn likes(&self, activity: &Activity) -> Result<Vec<Identity>> {
        let activity_id = activity.require_id()?;
        let path = format!("activity/{}/likes.json", segment(SERVICE, &activity_id)?);
        let body = self.fetch(&path, &QueryParams::new()).await?;
        decode_many(SERVICE, &body)
    }

    /// Like an activity as the current session's user
    pub async fn like(&self, activity: &Activity) -> Result<Like> {
        let activity_id = activity.require_id()?;
        let path = format!("activity/{}/like.json", segment(SERVICE, &activity_id)?);
        self.toggle_like(&path, activity_id, true).await
    }

    pub async fn unlike(&self, activity: &Activity) -> Result<Like> {
        let activity_id = activity.require_id()?;
        let path = format!("activity/{}/like/destroy.json", segment(SERVICE, &activity_id)?);
        self.toggle_like(&path, activity_id, false).await
    }

    /// The server answers `{"like": <state>}`; anything else is rejected
    async fn toggle_like(&self, path: &str, activity_id: String, expected: bool) -> Result<Like> {
        let body = self.submit(path, None).await?;
        let response: LikeResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::parse(SERVICE, CodecError::Parse(e)))?;

        match response.like {
            Some(like) if like == expected => Ok(Like::new(activity_id, None)),
            Some(like) => Err(ServiceError::invalid_response(
                SERVICE,
                format!("like flag is {}, expected {}", like, expected),
            )
            .into()),
            None => Err(ServiceError::invalid_response(SERVICE, "like flag missing").into()),
        }
    }

    // =========================================================================
    // Lazily fetched relations
    // =========================================================================

    /// Stream metadata of an activity, fetched once when not already embedded
    pub async fn activity_stream<'a>(&self, activity: &'a mut Activity) -> Result<&'a ActivityStream> {
        if activity.fields().nested_is_empty(ActivityField::ActivityStream) {
            let id = activity.require_id()?;
            tracing::debug!("Fetching activity stream metadata for {}", id);
            let params = QueryParams::new().flag(QueryParams::ACTIVITY_STREAM, true);
            let mut fetched = self.get_with(&id, &params).await?;
            activity.adopt_activity_stream(&mut fetched);
        }
        activity.activity_stream()
    }

    /// Poster of an activity, fetched by `identityId` when not already embedded
    pub async fn poster_identity<'a>(&self, activity: &'a mut Activity) -> Result<&'a Identity> {
        if activity.fields().nested_is_empty(ActivityField::PosterIdentity) {
            let identity_id = activity
                .identity_id()?
                .filter(|id| !id.is_empty())
                .ok_or_else(|| Error::missing_field(SERVICE, "identityId"))?;
            let identity = IdentityService::new(self.client.clone())
                .get(&identity_id)
                .await?;
            activity.set_poster_identity(identity);
        }
        activity.poster_identity()
    }

    // =========================================================================
    // Streams
    // =========================================================================

    /// Activities posted by or to an identity
    pub fn activity_stream_list(&self, identity: &Identity) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::User, QueryParams::new())
    }

    pub fn activity_stream_list_with(
        &self,
        identity: &Identity,
        params: QueryParams,
    ) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::User, params)
    }

    pub fn spaces_activity_stream(&self, identity: &Identity) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::Spaces, QueryParams::new())
    }

    pub fn spaces_activity_stream_with(
        &self,
        identity: &Identity,
        params: QueryParams,
    ) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::Spaces, params)
    }

    pub fn connections_activity_stream(&self, identity: &Identity) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::Connections, QueryParams::new())
    }

    pub fn connections_activity_stream_with(
        &self,
        identity: &Identity,
        params: QueryParams,
    ) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::Connections, params)
    }

    pub fn feed_activity_stream(&self, identity: &Identity) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::Feed, QueryParams::new())
    }

    pub fn feed_activity_stream_with(
        &self,
        identity: &Identity,
        params: QueryParams,
    ) -> Result<PagedListAccess<Activity>> {
        self.stream(identity, StreamKind::Feed, params)
    }

    fn stream(
        &self,
        identity: &Identity,
        kind: StreamKind,
        params: QueryParams,
    ) -> Result<PagedListAccess<Activity>> {
        let identity_id = identity.require_id()?;
        Ok(PagedListAccess::with_params(
            self.client.clone(),
            identity_id,
            kind,
            params,
        ))
    }

    async fn fetch(&self, path: &str, params: &QueryParams) -> Result<String> {
        let url = self
            .client
            .api_url_with_query(SERVICE, path, params.iter())?;
        let session = self.client.current_session();
        Ok(self
            .http
            .get(url.as_str(), AuthPolicy::BasicAuth, &session)
            .await?)
    }

    async fn submit(&self, path: &str, body: Option<String>) -> Result<String> {
        let url = self.client.api_url(SERVICE, path)?;
        let session = self.client.current_session();
        Ok(self
            .http
            .post(url.as_str(), AuthPolicy::BasicAuth, &session, body)
            .await?)
    }
}

impl CrudService<Activity> for ActivityService {
    const RESOURCE: &'static str = SERVICE;
    const SUPPORTED: &'static [Operation] = &[
        Operation::Create,
        Operation::Get,
        Operation::Delete,
        Operation::CreateComment,
        Operation::DeleteComment,
        Operation::Like,
        Operation::Unlike,
    ];

    async fn create(&self, activity: &Activity) -> Result<Activity> {
        let body = self.submit("activity.json", Some(encode(SERVICE, activity)?)).await?;
        decode_one(SERVICE, &body)
    }

    async fn get(&self, id: &str) -> Result<Activity> {
        self.get_with(id, &QueryParams::new()).await
    }

    async fn delete(&self, activity: &Activity) -> Result<Activity> {
        let id = activity.require_id()?;
        let path = format!("activity/destroy/{}.json", segment(SERVICE, &id)?);
        let body = self.submit(&path, None).await?;
        decode_one(SERVICE, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn service() -> ActivityService {
        // Nothing listens here: every test below must fail before sending
        let client = SocialClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
        client.activities()
    }

    #[test]
    fn test_capabilities() {
        assert!(ActivityService::supports(Operation::Create));
        assert!(ActivityService::supports(Operation::Like));
        assert!(!ActivityService::supports(Operation::Update));
        assert!(!ActivityService::supports(Operation::GetComment));
    }

    #[tokio::test]
    async fn test_update_is_unsupported_whatever_the_input() {
        let service = service();
        assert!(service.update(&Activity::new()).await.unwrap_err().is_unsupported());

        let mut activity = Activity::new();
        activity.set_id("a1");
        activity.set_title("hello");
        let err = service.update(&activity).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOperation {
                resource: "activity",
                operation: Operation::Update
            }
        ));
    }

    #[tokio::test]
    async fn test_get_comment_is_unsupported() {
        assert!(service().get_comment("c1").await.unwrap_err().is_unsupported());
    }

    #[tokio::test]
    async fn test_missing_ids_fail_before_request() {
        let service = service();
        let err = service.delete(&Activity::new()).await.unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "id", .. }));

        let mut comment = Comment::with_text("orphan");
        comment.set_id("c1");
        let err = service.delete_comment(&comment).await.unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "activityId", .. }));

        let err = service.poster_identity(&mut Activity::new()).await.unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "identityId", .. }));

        assert!(service.feed_activity_stream(&Identity::new()).is_err());
    }

    #[tokio::test]
    async fn test_embedded_relations_need_no_request() {
        let mut activity: Activity = crate::codec::decode_one(
            r#"{"id":"a1","activityStream":{"type":"space","prettyId":"eng"},
                "posterIdentity":{"id":"i1","remoteId":"demo"}}"#,
        )
        .unwrap();
        let service = service();

        let stream = service.activity_stream(&mut activity).await.unwrap();
        assert_eq!(stream.pretty_id().unwrap().as_deref(), Some("eng"));

        let poster = service.poster_identity(&mut activity).await.unwrap();
        assert_eq!(poster.remote_id().unwrap().as_deref(), Some("demo"));
    }

    #[test]
    fn test_stream_constructors() {
        let mut identity = Identity::new();
        identity.set_id("i1");
        let service = service();

        let access = service.connections_activity_stream(&identity).unwrap();
        assert_eq!(access.kind(), StreamKind::Connections);
        assert_eq!(access.identity_id(), "i1");

        let params = QueryParams::new().flag(QueryParams::POSTER_IDENTITY, true);
        let access = service.feed_activity_stream_with(&identity, params).unwrap();
        assert_eq!(access.params().get(QueryParams::POSTER_IDENTITY), Some("t"));
    }
}
