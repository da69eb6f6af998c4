//! Form models and client-side validation
//!
//! Forms reject bad input before anything is sent. Credential rules come from
//! `board_api::validation` so the client and the proxy agree.

use board_api::validation::{validate_signin, validate_signup};
use board_api::{
    Attachment, Board, BoardRequest, BoardUpload, MAX_ATTACHMENT_BYTES, SigninRequest,
    SignupRequest, ValidationError,
};

/// Rejected form input. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("제목, 내용, 카테고리를 모두 입력해주세요.")]
    MissingBoardFields,

    #[error("파일 크기가 너무 큽니다. 최대 1MB까지 업로드 가능합니다.")]
    FileTooLarge,

    #[error(transparent)]
    Credentials(#[from] ValidationError),
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<SigninRequest, FormError> {
        let req = SigninRequest {
            username: self.username.trim().to_owned(),
            password: self.password.clone(),
        };
        validate_signin(&req)?;
        Ok(req)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<SignupRequest, FormError> {
        let req = SignupRequest {
            username: self.username.trim().to_owned(),
            name: self.name.trim().to_owned(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        };
        validate_signup(&req)?;
        Ok(req)
    }
}

/// Create/edit form for a post.
#[derive(Debug, Clone, Default)]
pub struct BoardForm {
    pub title: String,
    pub content: String,
    pub category: String,
    pub file: Option<Attachment>,
}

impl BoardForm {
    /// Prefill the edit form from an existing post. Attachments are not
    /// carried over; only a newly chosen file is uploaded.
    pub fn from_board(board: &Board) -> Self {
        Self {
            title: board.title.clone(),
            content: board.content.clone(),
            category: board.category.clone(),
            file: None,
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty()
            || self.content.trim().is_empty()
            || self.category.trim().is_empty()
        {
            return Err(FormError::MissingBoardFields);
        }
        if self
            .file
            .as_ref()
            .is_some_and(|f| f.data.len() > MAX_ATTACHMENT_BYTES)
        {
            return Err(FormError::FileTooLarge);
        }
        Ok(())
    }

    /// Validate and build the multipart upload.
    pub fn to_upload(&self) -> crate::Result<BoardUpload> {
        self.validate()?;
        let request = BoardRequest {
            title: self.title.trim().to_owned(),
            content: self.content.clone(),
            category: self.category.trim().to_owned(),
        };
        Ok(BoardUpload::new(&request, self.file.clone())?)
    }
}
