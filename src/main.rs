#[actix_web::main]
async fn main() -> std::io::Result<()> {
    survey_api::run().await
}
