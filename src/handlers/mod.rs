pub mod auth;
pub mod categorias;
pub mod clientes;
pub mod compras;
pub mod personas;
pub mod productos;
pub mod proveedores;
pub mod sistema;
pub mod ventas;
