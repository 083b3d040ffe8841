use crate::{
    config::Config,
    error::Result,
    ml::OpenAiEmbedder,
    routes::api_routes,
    services::{ChatService, IndexRetriever, OpenAiCompletion, PineconeClient},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::net::TcpListener;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}:{}", self.host, self.port);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        // The embedder, index client and completion client are built once and
        // shared across workers; per-request state lives in the request.
        let embedder = OpenAiEmbedder::new(&self.config)?;
        let index = PineconeClient::new(
            &self.config.pinecone_api_key,
            &self.config.pinecone_index_host,
        )?;
        let retriever = IndexRetriever::new(embedder, index);
        let completion = OpenAiCompletion::new(&self.config)?;

        let chat_service = web::Data::new(ChatService::new(
            retriever,
            completion,
            self.config.top_k,
        ));

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(chat_service.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
