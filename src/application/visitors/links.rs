/// Builds the absolute URLs that appear in outgoing emails.
#[derive(Debug, Clone)]
pub struct PublicLinks {
    base_url: String,
}

impl PublicLinks {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn approve_url(&self, secret: &str) -> String {
        format!("{}/api/visitors/approve/{}", self.base_url, secret)
    }

    pub fn reject_url(&self, secret: &str) -> String {
        format!("{}/api/visitors/reject/{}", self.base_url, secret)
    }

    pub fn image_url(&self, image_ref: &str) -> String {
        format!("{}/uploads/{}", self.base_url, image_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_ignored() {
        let links = PublicLinks::new("https://gate.example.com/");
        assert_eq!(
            links.approve_url("abc"),
            "https://gate.example.com/api/visitors/approve/abc"
        );
        assert_eq!(links.image_url("v.jpg"), "https://gate.example.com/uploads/v.jpg");
    }
}
