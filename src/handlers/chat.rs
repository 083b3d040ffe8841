use crate::{
    error::ApiError,
    models::ChatRequest,
    services::AppChatService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn chat_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/chat").route(web::post().to(chat)));
}

/// Generate a five-book reading list for the question and preferences in the
/// request body. Both outcome shapes (`reading_list` or `error`/`raw`) come
/// back as 200; transport failures surface through `ApiError`.
pub async fn chat(
    request: Json<ChatRequest>,
    service: web::Data<AppChatService>,
) -> Result<HttpResponse, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::InvalidInput("Question cannot be empty".to_string()));
    }

    let outcome = service
        .get_chatbot_response(&request.question, &request.preferences)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
