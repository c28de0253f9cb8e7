// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::auth::{AuthResponse, Claims, Employee},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    employee_repo: EmployeeRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(employee_repo: EmployeeRepository, jwt_secret: String) -> Self {
        Self { employee_repo, jwt_secret }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let employee = self
            .employee_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::AuthenticationFailed("Invalid email or password".to_string()))?;

        let password_clone = password.to_owned();
        let password_hash_clone = employee.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::AuthenticationFailed("Invalid email or password".to_string()));
        }

        let token = self.create_token(&employee)?;
        tracing::info!(employee_id = employee.id, "Login de funcionário");
        Ok(AuthResponse { employee, token })
    }

    /// Token válido e funcionário ainda existente.
    pub async fn validate_token(&self, token: &str) -> Result<Employee, AppError> {
        let claims = self.decode_claims(token)?;
        self.employee_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::AuthenticationFailed("Employee does not exist".to_string()))
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &DecodingKey::from_secret(self.jwt_secret.as_ref()), &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::AuthenticationFailed("Invalid token type".to_string()))
    }

    pub fn create_token(&self, employee: &Employee) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: employee.id,
            email: employee.email.clone(),
            role: employee.role,
            store_id: employee.store_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(self.jwt_secret.as_ref()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::test_support::lazy_pool, models::auth::EmployeeRole};

    fn employee() -> Employee {
        Employee {
            id: 12,
            name: Some("Priya".into()),
            email: "priya@striketheball.in".into(),
            password_hash: String::new(),
            phone: None,
            employee_code: Some("EMP-12".into()),
            role: EmployeeRole::Employee,
            store_id: Some(2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_carries_identity_role_and_store() {
        let auth = AuthService::new(EmployeeRepository::new(lazy_pool()), "segredo".into());
        let token = auth.create_token(&employee()).unwrap();

        let claims = auth.decode_claims(&token).unwrap();
        assert_eq!(claims.sub, 12);
        assert_eq!(claims.email, "priya@striketheball.in");
        assert_eq!(claims.role, EmployeeRole::Employee);
        assert_eq!(claims.store_id, Some(2));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let issuer = AuthService::new(EmployeeRepository::new(lazy_pool()), "um".into());
        let verifier = AuthService::new(EmployeeRepository::new(lazy_pool()), "outro".into());
        let token = issuer.create_token(&employee()).unwrap();

        let err = verifier.decode_claims(&token).unwrap_err();
        assert!(matches!(err, AppError::AuthenticationFailed(ref m) if m == "Invalid token type"));
    }
}
